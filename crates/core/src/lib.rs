//! Domain types, configuration, and error taxonomy for the Wuthering
//! Waves build bot.
//!
//! - `character` - resonator slugs, display names, and the optional-field
//!   build detail record as the API serves it
//! - `config` - layered application configuration (defaults, TOML file,
//!   `WUWABOT_*` env overrides)
//! - `errors` - lookup failure classification with user-safe messages

pub mod character;
pub mod config;
pub mod errors;

pub use character::{
    display_name, normalize_slug, scalar_text, CharacterDetail, CharacterSummary, EchoSetBuild,
    WeaponBuild, SCRAPE_ERROR_CODE,
};
pub use errors::LookupError;
