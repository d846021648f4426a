use serde::Deserialize;
use serde_json::Value;

/// Error marker the API returns when its scraper could not produce build
/// data for a resonator. Retrying a lookup that reports this is futile.
pub const SCRAPE_ERROR_CODE: &str = "SCRAPE_ERROR";

/// A resonator as it appears in the roster listing: just the API slug.
///
/// The display name is always derived from the slug, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharacterSummary {
    slug: String,
}

impl CharacterSummary {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn display_name(&self) -> String {
        display_name(&self.slug)
    }
}

/// Converts an API slug (`the-shorekeeper`) into a display name
/// (`The Shorekeeper`). Pure and deterministic.
pub fn display_name(slug: &str) -> String {
    slug.split('-').map(capitalize_word).collect::<Vec<_>>().join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().chars()).collect(),
        None => String::new(),
    }
}

/// Lower-cases a user-supplied resonator name into the API slug casing.
pub fn normalize_slug(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Detailed build record for one resonator.
///
/// Every section is optional on the wire; an absent section is simply
/// omitted from rendering, never an error.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterDetail {
    pub error_code: Option<String>,
    pub portrait_url: Option<String>,
    pub skill_priority: Option<Vec<String>>,
    pub substat_priority: Option<String>,
    pub endgame_stats: Option<serde_json::Map<String, Value>>,
    pub weapon_builds: Option<Vec<WeaponBuild>>,
    pub echo_set_builds: Option<Vec<EchoSetBuild>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponBuild {
    pub name: String,
    pub duplicates: u32,
    pub percentage: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoSetBuild {
    pub set_name: String,
    pub echo_name: String,
    pub percentage: String,
}

/// Renders a JSON scalar the way a user should read it: strings without
/// surrounding quotes, everything else via its JSON form.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_title_cases_hyphenated_slugs() {
        assert_eq!(display_name("the-shorekeeper"), "The Shorekeeper");
        assert_eq!(display_name("jiyan"), "Jiyan");
        assert_eq!(display_name("rover-havoc"), "Rover Havoc");
    }

    #[test]
    fn display_name_is_deterministic() {
        assert_eq!(display_name("camellya"), display_name("camellya"));
    }

    #[test]
    fn normalize_slug_lower_cases_and_trims() {
        assert_eq!(normalize_slug("  Jiyan "), "jiyan");
        assert_eq!(normalize_slug("The-Shorekeeper"), "the-shorekeeper");
    }

    #[test]
    fn detail_deserializes_with_all_sections_absent() {
        let detail: CharacterDetail = serde_json::from_value(json!({})).expect("empty object");
        assert_eq!(detail, CharacterDetail::default());
    }

    #[test]
    fn detail_deserializes_camel_case_sections() {
        let detail: CharacterDetail = serde_json::from_value(json!({
            "portraitUrl": "/static/chixia.png",
            "skillPriority": ["Resonance Liberation", "Basic Attack"],
            "substatPriority": "Crit Rate > Crit DMG",
            "endgameStats": {"Crit Rate": "70%"},
            "weaponBuilds": [{"name": "Static Mist", "duplicates": 1, "percentage": "32.5%"}],
            "echoSetBuilds": [
                {"setName": "Sierra Gale", "echoName": "Feilian Beringal", "percentage": "88.1%"}
            ]
        }))
        .expect("full object");

        assert_eq!(detail.portrait_url.as_deref(), Some("/static/chixia.png"));
        assert_eq!(detail.skill_priority.as_deref().map(<[String]>::len), Some(2));
        let weapons = detail.weapon_builds.expect("weapons");
        assert_eq!(weapons[0].duplicates, 1);
        let echoes = detail.echo_set_builds.expect("echoes");
        assert_eq!(echoes[0].set_name, "Sierra Gale");
    }

    #[test]
    fn scalar_text_drops_json_quoting_for_strings() {
        assert_eq!(scalar_text(&json!("70%")), "70%");
        assert_eq!(scalar_text(&json!(2200)), "2200");
    }
}
