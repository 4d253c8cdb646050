//! Typed gateway endpoints
//!
//! Each operation POSTs a fixed JSON body with the broker's bearer token,
//! unwraps the encrypted response envelope, and normalizes the decrypted
//! `data` substructure into canonical records. A failure at any stage
//! (network, envelope, malformed data) degrades to an empty collection;
//! nothing here raises past the client, and the UI renders from absence
//! of data.
//!
//! Upstream records spell the same attribute several ways depending on
//! endpoint and record age. Normalization applies an explicit ordered
//! candidate-field list per attribute; the first field that holds a
//! non-empty value wins. The lists below are part of the contract.

use crate::cipher;
use crate::token::TokenBroker;
use crate::types::{ContentKind, ContentRecord, GatewayConfig, HomeContent, HomeSection, SliderItem};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

// Candidate field lists, in precedence order.
const CHANNEL_ID_FIELDS: &[&str] = &["id", "channelId"];
const CHANNEL_NAME_FIELDS: &[&str] = &["channelName", "name"];
const CHANNEL_ART_FIELDS: &[&str] = &["logo", "image"];
const CHANNEL_SLUG_FIELDS: &[&str] = &["channelSlug", "slug"];
const SLIDE_ID_FIELDS: &[&str] = &["id", "programId"];
const SLIDE_THUMB_FIELDS: &[&str] = &["image", "thumbnail"];
const SECTION_TITLE_FIELDS: &[&str] = &["categoryName", "name"];
const PROGRAM_ID_FIELDS: &[&str] = &["slug", "id"];
const PROGRAM_NAME_FIELDS: &[&str] = &["programName", "name"];
const PROGRAM_ART_FIELDS: &[&str] = &["portrait_poster", "image", "poster"];
const GENRE_NAME_FIELDS: &[&str] = &["name", "title"];
const GENRE_ART_FIELDS: &[&str] = &["portrait_poster", "image"];

/// Home sections whose title contains this substring are dropped; the
/// movies tab is fed from the genre endpoint instead.
const EXCLUDED_SECTION_SUBSTRING: &str = "movies";

/// First non-empty candidate field, stringified. Upstream ids arrive as
/// either strings or numbers.
pub(crate) fn pick(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(*field) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn kind_of(record: &Value, default: ContentKind) -> ContentKind {
    ContentKind::parse_or(record.get("type").and_then(Value::as_str), default)
}

fn normalize_channel(record: &Value) -> Option<ContentRecord> {
    Some(ContentRecord {
        id: format!("ch-{}", pick(record, CHANNEL_ID_FIELDS)?),
        name: pick(record, CHANNEL_NAME_FIELDS).unwrap_or_default(),
        art: pick(record, CHANNEL_ART_FIELDS),
        slug: pick(record, CHANNEL_SLUG_FIELDS),
        kind: ContentKind::Channel,
    })
}

fn normalize_slide(record: &Value) -> Option<SliderItem> {
    Some(SliderItem {
        id: format!("slide-{}", pick(record, SLIDE_ID_FIELDS)?),
        title: pick(record, CHANNEL_NAME_FIELDS).unwrap_or_default(),
        thumbnail: pick(record, SLIDE_THUMB_FIELDS),
        slug: pick(record, CHANNEL_SLUG_FIELDS),
        kind: kind_of(record, ContentKind::Channel),
    })
}

fn normalize_program(record: &Value) -> Option<ContentRecord> {
    Some(ContentRecord {
        id: pick(record, PROGRAM_ID_FIELDS)?,
        name: pick(record, PROGRAM_NAME_FIELDS).unwrap_or_else(|| "Untitled".to_string()),
        art: pick(record, PROGRAM_ART_FIELDS),
        slug: pick(record, &["slug"]),
        kind: kind_of(record, ContentKind::Vod),
    })
}

fn normalize_genre_program(record: &Value) -> Option<ContentRecord> {
    let slug = pick(record, &["slug"])?;
    Some(ContentRecord {
        id: format!("gen-{slug}"),
        name: pick(record, GENRE_NAME_FIELDS).unwrap_or_default(),
        art: pick(record, GENRE_ART_FIELDS),
        slug: Some(slug),
        kind: kind_of(record, ContentKind::Vod),
    })
}

fn records_at<'a>(payload: &'a Value, pointer: &str) -> &'a [Value] {
    payload
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Channels from a decrypted live-tv payload.
fn channels_from(payload: &Value) -> Vec<ContentRecord> {
    records_at(payload, "/data/channels")
        .iter()
        .filter_map(normalize_channel)
        .collect()
}

/// Slider and sections from a decrypted home payload. Empty sections and
/// the excluded movies sections are dropped here, not in the UI.
fn home_from(payload: &Value) -> HomeContent {
    let slider = records_at(payload, "/data/slider")
        .iter()
        .filter_map(normalize_slide)
        .collect();

    let sections = records_at(payload, "/data/chunks")
        .iter()
        .map(|chunk| HomeSection {
            title: pick(chunk, SECTION_TITLE_FIELDS).unwrap_or_else(|| "Featured".to_string()),
            items: records_at(chunk, "/programs")
                .iter()
                .filter_map(normalize_program)
                .collect(),
        })
        .filter(|section| {
            !section.items.is_empty()
                && !section
                    .title
                    .to_lowercase()
                    .contains(EXCLUDED_SECTION_SUBSTRING)
        })
        .collect();

    HomeContent { slider, sections }
}

/// Programs from a decrypted genre payload.
fn genre_programs_from(payload: &Value) -> Vec<ContentRecord> {
    records_at(payload, "/data/programData")
        .iter()
        .filter_map(normalize_genre_program)
        .collect()
}

/// Authenticated catalog client.
pub struct GatewayClient {
    http: Client,
    broker: Arc<TokenBroker>,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, broker: Arc<TokenBroker>) -> Self {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            broker,
            config,
        }
    }

    /// POST one enveloped endpoint and return the decrypted payload.
    async fn post_enveloped(
        &self,
        base: &str,
        endpoint: &'static str,
        body: Value,
    ) -> Option<Value> {
        let token = self.broker.token(false).await;
        let response = match self
            .http
            .post(format!("{base}{endpoint}"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(endpoint, %err, "gateway request failed");
                return None;
            }
        };

        let envelope: Value = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(endpoint, %err, "gateway response was not JSON");
                return None;
            }
        };

        let payload = envelope
            .get("eData")
            .and_then(Value::as_str)
            .and_then(cipher::decrypt_envelope);
        if payload.is_none() {
            debug!(endpoint, "envelope missing or undecodable");
        }
        payload
    }

    /// Channel list for the TV tab.
    #[instrument(skip(self))]
    pub async fn live_channels(&self) -> Vec<ContentRecord> {
        let body = json!({
            "project_id": self.config.project_id,
            "platform": self.config.platform,
        });
        match self
            .post_enveloped(&self.config.channels_base, "live-tv", body)
            .await
        {
            Some(payload) => channels_from(&payload),
            None => Vec::new(),
        }
    }

    /// Hero slider and curated sections for the home tab.
    #[instrument(skip(self))]
    pub async fn home_content(&self) -> HomeContent {
        let body = json!({
            "user_id": "0",
            "project_id": self.config.project_id,
            "platform": self.config.platform,
        });
        match self
            .post_enveloped(&self.config.carousel_base, "home-programs-carousal", body)
            .await
        {
            Some(payload) => home_from(&payload),
            None => HomeContent::default(),
        }
    }

    /// Programs for one genre row.
    #[instrument(skip(self))]
    pub async fn genre_programs(&self, genre_slug: &str) -> Vec<ContentRecord> {
        let body = json!({
            "genre_slug": genre_slug,
            "project_id": self.config.project_id,
            "platform": self.config.platform,
        });
        match self
            .post_enveloped(&self.config.carousel_base, "genre-programs-carousal", body)
            .await
        {
            Some(payload) => genre_programs_from(&payload),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_normalization_precedence() {
        let payload = json!({"data": {"channels": [
            {"id": 7, "channelName": "ESPN HD", "name": "ignored",
             "logo": "logo.png", "image": "ignored.png",
             "channelSlug": "espn", "slug": "ignored"},
            {"channelId": "44", "name": "Fallback TV", "image": "img.png", "slug": "fallback"},
            {"name": "No Id"}
        ]}});

        let channels = channels_from(&payload);
        assert_eq!(channels.len(), 2);

        assert_eq!(channels[0].id, "ch-7");
        assert_eq!(channels[0].name, "ESPN HD");
        assert_eq!(channels[0].art.as_deref(), Some("logo.png"));
        assert_eq!(channels[0].slug.as_deref(), Some("espn"));
        assert_eq!(channels[0].kind, ContentKind::Channel);

        assert_eq!(channels[1].id, "ch-44");
        assert_eq!(channels[1].name, "Fallback TV");
        assert_eq!(channels[1].art.as_deref(), Some("img.png"));
    }

    #[test]
    fn slider_normalization() {
        let payload = json!({"data": {"slider": [
            {"programId": 12, "name": "Featured Show", "thumbnail": "t.png",
             "slug": "featured-show", "type": "vod"},
            {"id": 3, "channelName": "Big Match", "image": "m.png", "channelSlug": "match"}
        ]}});

        let home = home_from(&payload);
        assert_eq!(home.slider.len(), 2);
        assert_eq!(home.slider[0].id, "slide-12");
        assert_eq!(home.slider[0].kind, ContentKind::Vod);
        assert_eq!(home.slider[1].id, "slide-3");
        assert_eq!(home.slider[1].title, "Big Match");
        assert_eq!(home.slider[1].kind, ContentKind::Channel);
    }

    #[test]
    fn home_sections_drop_empty_and_movies() {
        let payload = json!({"data": {"chunks": [
            {"categoryName": "Trending", "programs": [
                {"slug": "drama-1", "programName": "Drama One", "portrait_poster": "p.png"}
            ]},
            {"categoryName": "Top Movies", "programs": [
                {"slug": "movie-1", "name": "A Movie"}
            ]},
            {"name": "MOVIES This Week", "programs": [
                {"slug": "movie-2", "name": "Another"}
            ]},
            {"categoryName": "Empty Row", "programs": []},
            {"programs": [{"slug": "misc-1", "name": "Misc"}]}
        ]}});

        let home = home_from(&payload);
        let titles: Vec<&str> = home.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Trending", "Featured"]);

        let trending = &home.sections[0];
        assert_eq!(trending.items[0].id, "drama-1");
        assert_eq!(trending.items[0].name, "Drama One");
        assert_eq!(trending.items[0].kind, ContentKind::Vod);
    }

    #[test]
    fn program_name_defaults_to_untitled() {
        let payload = json!({"data": {"chunks": [
            {"categoryName": "Row", "programs": [{"slug": "mystery"}]}
        ]}});

        let home = home_from(&payload);
        assert_eq!(home.sections[0].items[0].name, "Untitled");
    }

    #[test]
    fn genre_normalization() {
        let payload = json!({"data": {"programData": [
            {"slug": "final-over", "name": "Final Over", "title": "ignored",
             "portrait_poster": "p.png", "type": "episode"},
            {"slug": "old-classic", "title": "Old Classic", "image": "i.png"},
            {"name": "No Slug"}
        ]}});

        let programs = genre_programs_from(&payload);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].id, "gen-final-over");
        assert_eq!(programs[0].name, "Final Over");
        assert_eq!(programs[0].kind, ContentKind::Episode);
        assert_eq!(programs[1].name, "Old Classic");
        assert_eq!(programs[1].art.as_deref(), Some("i.png"));
        assert_eq!(programs[1].kind, ContentKind::Vod);
    }

    #[test]
    fn missing_data_yields_empty() {
        assert!(channels_from(&json!({})).is_empty());
        assert!(channels_from(&json!({"data": {"channels": "not-an-array"}})).is_empty());
        let home = home_from(&json!({"data": {}}));
        assert!(home.slider.is_empty());
        assert!(home.sections.is_empty());
        assert!(genre_programs_from(&json!(null)).is_empty());
    }
}
