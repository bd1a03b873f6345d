use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CATEGORY: &str = "Platos";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
}

fn default_available() -> bool {
    true
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

// Older menus were stored without a category, or with an empty one.
fn category_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|category| !category.trim().is_empty())
        .unwrap_or_else(default_category))
}

fn dish(id: &str, name: &str, description: &str, price: f64, seed: &str, category: &str) -> Dish {
    Dish {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        image_url: format!("https://picsum.photos/seed/{seed}/800/600"),
        available: true,
        category: category.to_string(),
    }
}

/// Menu served until an admin or a suggestion replaces it.
pub fn default_menu() -> Vec<Dish> {
    vec![
        dish(
            "1",
            "La Bandera Dominicana",
            "Arroz blanco, habichuelas rojas guisadas, carne de pollo o res, y ensalada verde.",
            350.0,
            "bandera",
            "Platos",
        ),
        dish(
            "2",
            "Sancocho Tradicional",
            "El clásico caldo dominicano con 7 carnes, víveres y aguacate.",
            450.0,
            "sancocho",
            "Platos",
        ),
        dish(
            "3",
            "Jugo de Chinola Natural",
            "Refrescante jugo de pasión (chinola) recién exprimido.",
            120.0,
            "chinola",
            "Bebidas",
        ),
        dish(
            "4",
            "Morir Soñando",
            "Bebida tradicional de leche y naranja con un toque de vainilla.",
            150.0,
            "morir",
            "Bebidas",
        ),
        dish(
            "5",
            "Habichuelas con Dulce",
            "Postre típico dominicano con galletitas de leche y pasas.",
            200.0,
            "postre",
            "Postres",
        ),
        dish(
            "6",
            "Majarete de Maíz",
            "Crema dulce de maíz tierno con canela espolvoreada.",
            175.0,
            "majarete",
            "Postres",
        ),
    ]
}
