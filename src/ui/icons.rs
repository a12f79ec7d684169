//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Draft indicators
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
pub static PICK: Emoji<'_, '_> = Emoji("🏈 ", ">");
pub static HUMAN: Emoji<'_, '_> = Emoji("🧑 ", "[YOU]");
pub static FALLBACK: Emoji<'_, '_> = Emoji("🔁 ", "[FB]");
pub static FAST_FORWARD: Emoji<'_, '_> = Emoji("⏩ ", ">>");
pub static TROPHY: Emoji<'_, '_> = Emoji("🏆 ", "*");
