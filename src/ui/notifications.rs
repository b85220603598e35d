use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use std::collections::VecDeque;

use crate::common::{Notice, NoticeLevel};

const MAX_TOASTS: usize = 5;

fn lifetime(level: NoticeLevel) -> f64 {
    match level {
        NoticeLevel::Info => 3.0,
        NoticeLevel::Warning => 6.0,
        NoticeLevel::Error => 10.0,
    }
}

#[derive(Debug)]
struct Toast {
    notice: Notice,
    expires_at: f64,
}

/// Recent notices, newest last, each living for a level-dependent time.
#[derive(Resource, Default, Debug)]
pub struct Notifications {
    toasts: VecDeque<Toast>,
}

impl Notifications {
    pub fn push(&mut self, notice: Notice, now: f64) {
        // Repeats refresh the existing toast
        self.toasts.retain(|toast| toast.notice != notice);
        let expires_at = now + lifetime(notice.level);
        self.toasts.push_back(Toast { notice, expires_at });
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }

    pub fn prune(&mut self, now: f64) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.toasts.iter().map(|toast| &toast.notice)
    }

    pub fn dismiss(&mut self, index: usize) {
        self.toasts.remove(index);
    }
}

pub fn collect_notices(
    mut reader: MessageReader<Notice>,
    time: Res<Time>,
    mut notifications: ResMut<Notifications>,
) {
    let now = time.elapsed_secs_f64();
    for notice in reader.read() {
        notifications.push(notice.clone(), now);
    }
}

fn level_color(level: NoticeLevel) -> egui::Color32 {
    match level {
        NoticeLevel::Info => egui::Color32::from_rgb(150, 200, 255),
        NoticeLevel::Warning => egui::Color32::from_rgb(230, 170, 60),
        NoticeLevel::Error => egui::Color32::from_rgb(230, 90, 80),
    }
}

/// Stack of toasts in the bottom-right corner of the canvas.
pub fn notifications_ui(
    mut contexts: EguiContexts,
    time: Res<Time>,
    mut notifications: ResMut<Notifications>,
) -> Result {
    notifications.prune(time.elapsed_secs_f64());
    if notifications.iter().next().is_none() {
        return Ok(());
    }

    let mut dismissed = None;
    egui::Area::new(egui::Id::new("notifications"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-16.0, -56.0])
        .order(egui::Order::Foreground)
        .show(contexts.ctx_mut()?, |ui| {
            for (index, notice) in notifications.iter().enumerate() {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(320.0);
                    ui.horizontal(|ui| {
                        ui.colored_label(level_color(notice.level), &notice.text);
                        if ui.small_button("x").clicked() {
                            dismissed = Some(index);
                        }
                    });
                });
                ui.add_space(4.0);
            }
        });
    if let Some(index) = dismissed {
        notifications.dismiss(index);
    }
    Ok(())
}
