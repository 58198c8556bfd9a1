//! Static industry/category reference data.

use axum::{Json, extract::Query, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Debug)]
pub struct Category {
    pub id: u32,
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub slug: &'static str,
    pub industry_id: u32,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct Industry {
    pub id: u32,
    pub name: &'static str,
    pub order_index: u32,
    pub slug: &'static str,
    pub role_id: u32,
    pub icon_name: &'static str,
}

#[derive(Deserialize, Debug)]
pub struct IndustriesQuery {
    /// Presence of the flag (any value) expands categories.
    pub categories: Option<String>,
}

const INDUSTRIES: [Industry; 3] = [
    Industry {
        id: 1,
        name: "Beauty & Fashion",
        order_index: 1,
        slug: "star-beauty-and-fashion",
        role_id: 1,
        icon_name: "beauty-and-fashion.svg",
    },
    Industry {
        id: 2,
        name: "Music & Dance",
        order_index: 2,
        slug: "star-music-dance",
        role_id: 1,
        icon_name: "music-dance.svg",
    },
    Industry {
        id: 3,
        name: "Film, T.V. & Ent.",
        order_index: 3,
        slug: "star-film-tv-ent",
        role_id: 1,
        icon_name: "film-tv-ent.svg",
    },
];

const CATEGORIES: [Category; 17] = [
    Category { id: 10, name: "Fashion Coordinator", description: None, slug: "fashion-coordinator", industry_id: 1 },
    Category { id: 11, name: "Modeling", description: None, slug: "modeling", industry_id: 1 },
    Category { id: 13, name: "Design & Manufacturing", description: None, slug: "design-manufacturing", industry_id: 1 },
    Category { id: 14, name: "Cosmetology", description: None, slug: "cosmetology", industry_id: 1 },
    Category { id: 15, name: "Beauty Pageant", description: None, slug: "beauty-pageant", industry_id: 1 },
    Category { id: 4, name: "Singer", description: None, slug: "singer", industry_id: 2 },
    Category { id: 5, name: "Dancing", description: None, slug: "dancing", industry_id: 2 },
    Category { id: 7, name: "Musician", description: None, slug: "musician", industry_id: 2 },
    Category { id: 8, name: "Musical Composition", description: None, slug: "musical-composition", industry_id: 2 },
    Category { id: 9, name: "Music Production", description: None, slug: "music-production", industry_id: 2 },
    Category { id: 1, name: "Filmmaking", description: None, slug: "filmmaking", industry_id: 3 },
    Category { id: 2, name: "Acting", description: None, slug: "acting", industry_id: 3 },
    Category { id: 3, name: "Radio", description: None, slug: "radio", industry_id: 3 },
    Category { id: 16, name: "Events & Promotions", description: None, slug: "events-promotions", industry_id: 3 },
    Category { id: 17, name: "Speaker", description: None, slug: "speaker", industry_id: 3 },
    Category { id: 18, name: "Photography", description: None, slug: "photography", industry_id: 3 },
    Category { id: 19, name: "Journalism", description: None, slug: "journalism", industry_id: 3 },
];

#[utoipa::path(
    get,
    path = "/v1/industries",
    params(
        ("categories" = Option<String>, Query, description = "Include categories per industry")
    ),
    responses(
        (status = 200, description = "Industry reference data")
    ),
    tag = "core"
)]
pub async fn industries(Query(query): Query<IndustriesQuery>) -> impl IntoResponse {
    (StatusCode::OK, Json(industries_body(query.categories.is_some())))
}

fn industries_body(expand_categories: bool) -> serde_json::Value {
    if expand_categories {
        let expanded: Vec<_> = INDUSTRIES
            .iter()
            .map(|industry| {
                let categories: Vec<_> = CATEGORIES
                    .iter()
                    .filter(|category| category.industry_id == industry.id)
                    .collect();
                json!({
                    "id": industry.id,
                    "name": industry.name,
                    "order_index": industry.order_index,
                    "slug": industry.slug,
                    "role_id": industry.role_id,
                    "icon_name": industry.icon_name,
                    "categories": categories,
                })
            })
            .collect();
        json!({ "industries": expanded })
    } else {
        json!({ "industries": INDUSTRIES })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_belongs_to_an_industry() {
        for category in &CATEGORIES {
            assert!(
                INDUSTRIES.iter().any(|i| i.id == category.industry_id),
                "category {} references unknown industry {}",
                category.slug,
                category.industry_id
            );
        }
    }

    #[test]
    fn plain_listing_omits_categories() {
        let body = industries_body(false);
        let listed = body["industries"].as_array().expect("industries array");
        assert_eq!(listed.len(), 3);
        assert!(listed[0].get("categories").is_none());
    }

    #[test]
    fn expanded_listing_groups_categories() {
        let body = industries_body(true);
        let listed = body["industries"].as_array().expect("industries array");
        let music = &listed[1];
        assert_eq!(music["name"], "Music & Dance");
        assert_eq!(music["categories"].as_array().map(Vec::len), Some(5));
    }
}
