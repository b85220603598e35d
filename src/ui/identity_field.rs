use bevy_egui::egui;

use crate::model::{IdentityInputError, parse_identity_input};

/// Text buffer for a region id, validated on commit.
///
/// The buffer follows the value it edits until the user types; a rejected
/// entry leaves the value untouched and keeps the error for display.
#[derive(Debug, Default)]
pub struct IdentityField {
    text: String,
    synced: Option<u32>,
    error: Option<IdentityInputError>,
}

impl IdentityField {
    /// Follow an externally changed value, discarding unsaved text.
    pub fn sync(&mut self, value: u32) {
        if self.synced != Some(value) {
            self.synced = Some(value);
            self.text = value.to_string();
            self.error = None;
        }
    }

    pub fn error(&self) -> Option<&IdentityInputError> {
        self.error.as_ref()
    }

    /// Parse the buffer. `None` means rejected (or unchanged).
    pub fn commit(&mut self) -> Option<u32> {
        match parse_identity_input(&self.text) {
            Ok(value) => {
                self.error = None;
                self.text = value.to_string();
                if self.synced == Some(value) {
                    return None;
                }
                self.synced = Some(value);
                Some(value)
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    /// Single-line editor committing on Enter or focus loss.
    pub fn show(&mut self, ui: &mut egui::Ui, width: f32) -> Option<u32> {
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.text)
                .desired_width(width)
                .char_limit(6),
        );
        let committed = if response.lost_focus() {
            self.commit()
        } else {
            None
        };
        if let Some(error) = &self.error {
            response.on_hover_text(error.to_string());
            ui.colored_label(egui::Color32::from_rgb(230, 90, 80), "!");
        }
        committed
    }
}
