use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::dish::{DEFAULT_CATEGORY, Dish};
use crate::models::event::DispatchEvent;
use crate::state::AppState;
use crate::suggest::{DEFAULT_THEME, accept_suggestions, suggestions_to_menu};

pub fn validate_menu(dishes: &[Dish]) -> Result<(), AppError> {
    let mut seen = HashSet::new();

    for dish in dishes {
        if dish.id.trim().is_empty() || dish.name.trim().is_empty() {
            return Err(AppError::BadRequest("dish id and name cannot be empty".to_string()));
        }
        if !dish.price.is_finite() || dish.price <= 0.0 {
            return Err(AppError::BadRequest(format!("dish {} must have a positive price", dish.id)));
        }
        if !seen.insert(dish.id.as_str()) {
            return Err(AppError::BadRequest(format!("duplicate dish id {}", dish.id)));
        }
    }

    Ok(())
}

/// Replaces the whole menu. Orders keep the names and prices they captured.
pub async fn replace_menu(state: &AppState, mut dishes: Vec<Dish>) -> Result<Vec<Dish>, AppError> {
    validate_menu(&dishes)?;
    for dish in &mut dishes {
        if dish.category.trim().is_empty() {
            dish.category = DEFAULT_CATEGORY.to_string();
        }
    }

    state.store.put_menu(&dishes).await?;

    info!(dishes = dishes.len(), "menu replaced");
    state.publish(DispatchEvent::MenuReplaced {
        dishes: dishes.len(),
    });
    Ok(dishes)
}

/// Asks the suggestion service for a themed menu and installs it. Any failure
/// leaves the current menu untouched.
pub async fn suggest_menu(state: &AppState, theme: Option<&str>) -> Result<Vec<Dish>, AppError> {
    let theme = theme
        .map(str::trim)
        .filter(|theme| !theme.is_empty())
        .unwrap_or(DEFAULT_THEME);

    let result = match &state.suggester {
        Some(suggester) => suggester
            .suggest(theme)
            .await
            .and_then(|raw| accept_suggestions(raw, state.max_suggested_dishes)),
        None => Err(AppError::SuggestionUnavailable(
            "no suggestion service configured".to_string(),
        )),
    };

    let suggestions = match result {
        Ok(suggestions) => suggestions,
        Err(err) => {
            state
                .metrics
                .menu_suggestions_total
                .with_label_values(&["unavailable"])
                .inc();
            warn!(theme, error = %err, "menu suggestion unavailable; keeping current menu");
            return Err(err);
        }
    };

    let menu = replace_menu(state, suggestions_to_menu(&suggestions, Utc::now())).await?;
    state
        .metrics
        .menu_suggestions_total
        .with_label_values(&["applied"])
        .inc();
    info!(theme, dishes = menu.len(), "suggested menu applied");

    Ok(menu)
}
