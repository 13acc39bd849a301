//! Color Constants
//!
//! Palette of the Qualiflow desktop client: a dark navy shell around light
//! content panels, plus the four sync indicator colors.

use eframe::egui::Color32;

/// Top bar background - Navy
pub const TOP_BAR_BG: Color32 = Color32::from_rgb(0x1E, 0x29, 0x3B);

/// Navigation sidebar background - Dark navy
pub const SIDEBAR_BG: Color32 = Color32::from_rgb(0x0F, 0x17, 0x2A);

/// Sidebar selected route
pub const SIDEBAR_SELECTED: Color32 = Color32::from_rgb(0x33, 0x41, 0x55);

/// Main content background - Off-white
pub const CONTENT_BG: Color32 = Color32::from_rgb(0xF8, 0xFA, 0xFC);

/// Card background
pub const CARD_BG: Color32 = Color32::WHITE;

/// Card border
pub const CARD_BORDER: Color32 = Color32::from_rgb(0xE2, 0xE8, 0xF0);

/// Text on dark backgrounds
pub const TEXT_LIGHT: Color32 = Color32::from_rgb(0xF1, 0xF5, 0xF9);

/// Primary text color
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0x0F, 0x17, 0x2A);

/// Secondary text color (muted)
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0x64, 0x74, 0x8B);

/// Accent color for primary buttons
pub const ACCENT: Color32 = Color32::from_rgb(0x25, 0x63, 0xEB);

/// Error color - Red
pub const ERROR: Color32 = Color32::from_rgb(0xDC, 0x26, 0x26);

/// Sync indicator: never synced
pub const SYNC_IDLE: Color32 = Color32::from_rgb(0x9C, 0xA3, 0xAF);

/// Sync indicator: attempt in flight
pub const SYNC_ACTIVE: Color32 = Color32::from_rgb(0xF5, 0x9E, 0x0B);

/// Sync indicator: last attempt failed
pub const SYNC_FAILED: Color32 = Color32::from_rgb(0xEF, 0x44, 0x44);

/// Sync indicator: up to date
pub const SYNC_OK: Color32 = Color32::from_rgb(0x22, 0xC5, 0x5E);

/// Online status indicator - Green
pub const STATUS_ONLINE: Color32 = SYNC_OK;

/// Offline status indicator - Red
pub const STATUS_OFFLINE: Color32 = SYNC_FAILED;
