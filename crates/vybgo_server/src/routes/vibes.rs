use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use vybgo_core::ride::Vibe;

use crate::state::AppState;

/// No auth here: the vibe picker is shown before login.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(list_vibes_handler))
}

/// Display entry for one vibe. Derived from the canonical [Vibe] enum so
/// the picker can never drift from what ride creation accepts.
#[derive(Debug, Clone, Serialize)]
pub struct VibeInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

pub fn catalog() -> Vec<VibeInfo> {
    Vibe::ALL.into_iter().map(describe).collect()
}

fn describe(vibe: Vibe) -> VibeInfo {
    match vibe {
        Vibe::Chill => VibeInfo {
            id: vibe.as_str(),
            name: "Chill",
            description: "Relaxed vibes for a smooth ride",
            color: "#4A90E2",
        },
        Vibe::Upbeat => VibeInfo {
            id: vibe.as_str(),
            name: "Upbeat",
            description: "High energy beats to keep you moving",
            color: "#E24A90",
        },
        Vibe::Focused => VibeInfo {
            id: vibe.as_str(),
            name: "Focused",
            description: "Productive sounds for your journey",
            color: "#90E24A",
        },
        Vibe::Custom => VibeInfo {
            id: vibe.as_str(),
            name: "Custom",
            description: "Your own soundtrack for the trip",
            color: "#E24A4A",
        },
    }
}

async fn list_vibes_handler() -> Json<Vec<VibeInfo>> {
    Json(catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_the_canonical_enum() {
        let ids: Vec<_> = catalog().into_iter().map(|info| info.id).collect();
        assert_eq!(ids, vec!["CHILL", "UPBEAT", "FOCUSED", "CUSTOM"]);
    }

    #[test]
    fn every_catalog_id_parses_as_a_vibe() {
        for info in catalog() {
            assert!(info.id.parse::<Vibe>().is_ok());
        }
    }
}
