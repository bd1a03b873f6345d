//! Menu suggestions from a generative text service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::SuggestConfig;
use crate::error::AppError;
use crate::models::dish::{DEFAULT_CATEGORY, Dish};

pub const DEFAULT_THEME: &str = "Criollo Tradicional";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DishSuggestion {
    pub name: String,
    pub description: String,
    pub price: f64,
}

#[async_trait]
pub trait MenuSuggester: Send + Sync {
    /// Returns the raw list produced for `theme`. Validation happens in
    /// [`accept_suggestions`].
    async fn suggest(&self, theme: &str) -> Result<Vec<DishSuggestion>, AppError>;
}

/// Rejects anything that could not become a menu: an empty list, blank names,
/// or prices that are not positive. Keeps at most `max` entries.
pub fn accept_suggestions(
    mut suggestions: Vec<DishSuggestion>,
    max: usize,
) -> Result<Vec<DishSuggestion>, AppError> {
    suggestions.truncate(max);

    if suggestions.is_empty() {
        return Err(AppError::SuggestionUnavailable("no dishes suggested".to_string()));
    }
    if let Some(bad) = suggestions
        .iter()
        .find(|s| s.name.trim().is_empty() || !s.price.is_finite() || s.price <= 0.0)
    {
        return Err(AppError::SuggestionUnavailable(format!(
            "unusable suggestion {:?} priced {}",
            bad.name, bad.price
        )));
    }

    Ok(suggestions)
}

pub fn suggestions_to_menu(suggestions: &[DishSuggestion], now: DateTime<Utc>) -> Vec<Dish> {
    let stamp = now.timestamp_millis();

    suggestions
        .iter()
        .enumerate()
        .map(|(idx, suggestion)| Dish {
            id: format!("ai-{stamp}-{idx}"),
            name: suggestion.name.trim().to_string(),
            description: suggestion.description.clone(),
            price: suggestion.price,
            image_url: format!(
                "https://picsum.photos/seed/{}/800/600",
                suggestion.name.trim().replace(' ', "%20")
            ),
            available: true,
            category: DEFAULT_CATEGORY.to_string(),
        })
        .collect()
}

/// Client for the Gemini `generateContent` endpoint with a structured JSON
/// response schema.
pub struct GeminiSuggester {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_dishes: usize,
}

impl GeminiSuggester {
    pub fn new(config: &SuggestConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_dishes: config.max_dishes,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &SuggestConfig) -> Option<Self> {
        config
            .api_key
            .clone()
            .map(|api_key| Self::new(config, api_key))
    }

    fn prompt(&self, theme: &str) -> String {
        format!(
            "Eres un chef experto en comida criolla Dominicana del restaurante \"El Neguev\". \
             Sugiere {} platos del día con el tema: {theme}. \
             Para cada plato dame: Nombre, una descripción deliciosa y un precio sugerido en Pesos Dominicanos (DOP).",
            self.max_dishes
        )
    }

    fn request_body(&self, theme: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": self.prompt(theme) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "price": { "type": "NUMBER" }
                        },
                        "required": ["name", "description", "price"],
                        "propertyOrdering": ["name", "description", "price"]
                    }
                }
            }
        })
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl MenuSuggester for GeminiSuggester {
    async fn suggest(&self, theme: &str) -> Result<Vec<DishSuggestion>, AppError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(theme))
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "menu suggestion request failed");
                AppError::SuggestionUnavailable(format!("request failed: {err}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::SuggestionUnavailable(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|err| {
            AppError::SuggestionUnavailable(format!("malformed response: {err}"))
        })?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().find_map(|p| p.text))
            .ok_or_else(|| AppError::SuggestionUnavailable("empty response".to_string()))?;

        serde_json::from_str(text.trim())
            .map_err(|err| AppError::SuggestionUnavailable(format!("malformed dishes: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{DishSuggestion, accept_suggestions, suggestions_to_menu};
    use crate::error::AppError;

    fn suggestion(name: &str, price: f64) -> DishSuggestion {
        DishSuggestion {
            name: name.to_string(),
            description: "rico".to_string(),
            price,
        }
    }

    #[test]
    fn empty_list_is_unusable() {
        let result = accept_suggestions(Vec::new(), 3);
        assert!(matches!(result, Err(AppError::SuggestionUnavailable(_))));
    }

    #[test]
    fn non_positive_price_is_unusable() {
        let result = accept_suggestions(vec![suggestion("Mangú", 250.0), suggestion("Tostones", 0.0)], 3);
        assert!(matches!(result, Err(AppError::SuggestionUnavailable(_))));
    }

    #[test]
    fn list_is_capped_before_validation() {
        let accepted = accept_suggestions(
            vec![
                suggestion("Mangú", 250.0),
                suggestion("Locrio", 300.0),
                suggestion("Chivo Guisado", 500.0),
                suggestion("", -1.0),
            ],
            3,
        )
        .unwrap();

        assert_eq!(accepted.len(), 3);
    }

    #[test]
    fn suggestions_become_available_platos() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let menu = suggestions_to_menu(&[suggestion("Mangú con Salami", 250.0)], now);

        assert_eq!(menu[0].id, "ai-1700000000000-0");
        assert_eq!(menu[0].category, "Platos");
        assert!(menu[0].available);
        assert_eq!(
            menu[0].image_url,
            "https://picsum.photos/seed/Mangú%20con%20Salami/800/600"
        );
    }
}
