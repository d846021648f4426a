//! Embed payload model and the canned views the bot replies with.
//!
//! The structs serialize to the Discord embed wire shape; the view
//! functions are pure transforms from domain records to embeds.

use serde::Serialize;
use wuwabot_core::{scalar_text, CharacterDetail, CharacterSummary};

use crate::commands::LatencyTier;

/// Signature purple used by the roster and build embeds.
pub const EMBED_COLOR: u32 = 0x8B008B;

pub const DATA_SOURCE_FOOTER: &str = "Data from Gathering Wives API | Wuthering Waves";

/// Weapon rows rendered per build embed; anything past this would make
/// the embed unreadably long.
pub const WEAPON_BUILD_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedMedia {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedTemplate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

pub struct EmbedBuilder {
    title: String,
    description: Option<String>,
    color: u32,
    fields: Vec<EmbedField>,
    thumbnail: Option<EmbedMedia>,
    footer: Option<EmbedFooter>,
}

impl EmbedBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            color: EMBED_COLOR,
            fields: Vec::new(),
            thumbnail: None,
            footer: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline: false });
        self
    }

    pub fn inline_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline: true });
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedMedia { url: url.into() });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn build(self) -> EmbedTemplate {
        EmbedTemplate {
            title: self.title,
            description: self.description,
            color: self.color,
            fields: self.fields,
            thumbnail: self.thumbnail,
            footer: self.footer,
        }
    }
}

/// One outbound interaction response: plain text or embeds, public or
/// ephemeral.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<EmbedTemplate>,
    pub ephemeral: bool,
}

impl InteractionReply {
    pub fn embed(embed: EmbedTemplate) -> Self {
        Self { content: None, embeds: vec![embed], ephemeral: false }
    }

    pub fn ephemeral_text(text: impl Into<String>) -> Self {
        Self { content: Some(text.into()), embeds: Vec::new(), ephemeral: true }
    }
}

/// Roster listing. Never called with an empty roster; the caller routes
/// that to `roster_unavailable_reply`.
pub fn roster_embed(roster: &[CharacterSummary]) -> EmbedTemplate {
    let names =
        roster.iter().map(CharacterSummary::display_name).collect::<Vec<_>>().join(", ");

    EmbedBuilder::new("Available Resonators")
        .description("Here are all available Resonators in the database:")
        .field("Characters", names)
        .footer("Use /resonator [name] to see detailed information about a specific Resonator.")
        .build()
}

pub fn roster_unavailable_reply() -> InteractionReply {
    InteractionReply::ephemeral_text("Failed to fetch character data. Please try again later.")
}

/// Build detail view. Every section is gated on presence; an absent
/// section is simply not rendered.
pub fn build_embed(
    detail: &CharacterDetail,
    display_name: &str,
    thumbnail_url: &str,
) -> EmbedTemplate {
    let mut builder = EmbedBuilder::new(format!("{display_name} - Resonator Build Information"))
        .thumbnail(thumbnail_url);

    if let Some(skills) = &detail.skill_priority {
        builder = builder.field("⚔️ Skill Priority", skills.join(" > "));
    }

    if let Some(substats) = &detail.substat_priority {
        builder = builder.field("📊 Substat Priority", substats.clone());
    }

    if let Some(stats) = &detail.endgame_stats {
        let lines = stats
            .iter()
            .map(|(stat, value)| format!("**{stat}:** {}", scalar_text(value)))
            .collect::<Vec<_>>()
            .join("\n");
        builder = builder.field("🎯 Endgame Stats", lines);
    }

    if let Some(weapons) = &detail.weapon_builds {
        let lines = weapons
            .iter()
            .take(WEAPON_BUILD_LIMIT)
            .map(|weapon| {
                format!("**{}** (S{}) - {}", weapon.name, weapon.duplicates, weapon.percentage)
            })
            .collect::<Vec<_>>()
            .join("\n");
        builder = builder.field("🗡️ Recommended Weapons", lines);
    }

    if let Some(echoes) = &detail.echo_set_builds {
        let lines = echoes
            .iter()
            .map(|echo| format!("**{}** ({}) - {}", echo.set_name, echo.echo_name, echo.percentage))
            .collect::<Vec<_>>()
            .join("\n");
        builder = builder.field("🔮 Recommended Echo Sets", lines);
    }

    builder.footer(DATA_SOURCE_FOOTER).build()
}

/// Liveness view with tier-specific color and thumbnail.
pub fn ping_embed(latency_ms: Option<u64>, tier: LatencyTier) -> EmbedTemplate {
    let latency_text = match latency_ms {
        Some(ms) => format!("`{ms}ms`"),
        None => "`unknown`".to_string(),
    };

    EmbedBuilder::new("Welcome Rover!")
        .description(
            "I'm Chixia, your companion! You can ask me about Resonators, Echoes, Builds etc.,",
        )
        .color(tier.color())
        .thumbnail(tier.thumbnail_url())
        .inline_field("Latency", latency_text)
        .inline_field("Health", tier.label())
        .build()
}
