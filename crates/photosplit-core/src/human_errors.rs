// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for the people digitising their photo albums.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how a front end presents the message.

use crate::error::PhotosplitError;

/// Severity of an outcome from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing failed, but the user should know (e.g. no photos found).
    Notice,
    /// User must do something (fix an edit, pick another file).
    ActionRequired,
    /// Cannot be fixed by the user: damaged file, disk failure.
    Permanent,
}

/// A human-readable message with an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Message for a scan in which detection found nothing.
pub fn no_photos_found() -> HumanError {
    HumanError {
        message: "No photos were found on this scan.".into(),
        suggestion: "Leave a little space between photos and make sure the scanner lid is closed, then scan again. You can also draw the photo outlines by hand.".into(),
        severity: Severity::Notice,
    }
}

/// Convert a `PhotosplitError` into a `HumanError`.
pub fn humanize_error(err: &PhotosplitError) -> HumanError {
    match err {
        PhotosplitError::QuadArity { found } => HumanError {
            message: "A photo outline is incomplete.".into(),
            suggestion: format!("Every outline needs four corners, this one has {found}. Delete it and draw it again."),
            severity: Severity::ActionRequired,
        },

        PhotosplitError::RotationCountMismatch { .. } => HumanError {
            message: "The photo list got out of step.".into(),
            suggestion: "Re-run detection on the scan and apply your rotations again.".into(),
            severity: Severity::ActionRequired,
        },

        PhotosplitError::IndexOutOfRange { what, .. } => HumanError {
            message: format!("That {what} no longer exists."),
            suggestion: "It may have been deleted. Refresh the preview and try again.".into(),
            severity: Severity::ActionRequired,
        },

        PhotosplitError::CoordinateOutOfRange { .. } | PhotosplitError::CanvasTooLarge { .. } => {
            HumanError {
                message: "A photo outline reaches far outside the scan.".into(),
                suggestion: "Move its corners back onto the scan and try again.".into(),
                severity: Severity::ActionRequired,
            }
        }

        PhotosplitError::InvalidConfig(detail) => HumanError {
            message: "The settings file has a mistake in it.".into(),
            suggestion: format!("Fix the setting or delete the file to go back to the defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },

        PhotosplitError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        PhotosplitError::Io(io) => match io.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file could not be found.".into(),
                suggestion: "Check the file name and folder, then try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Photosplit isn't allowed to use that folder.".into(),
                suggestion: "Pick a folder you own, such as your Pictures folder.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: "Make sure the disk isn't full, then try again.".into(),
                severity: Severity::Permanent,
            },
        },

        PhotosplitError::Serialization(_) => HumanError {
            message: "A saved file couldn't be read.".into(),
            suggestion: "The file may be damaged. Delete it and let Photosplit create a new one.".into(),
            severity: Severity::Permanent,
        },
    }
}
