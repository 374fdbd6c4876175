use a2ui::{ActionHandler, Agent, Component, dispatch::SearchHandler};
use serde_json::{Value, json};

/// Surface id.
pub const SURFACE_ID: &str = "restaurant-finder";

/// Every restaurant.
pub fn all_restaurants() -> Vec<Value> {
    vec![
        json!({"name": "The Golden Fork", "cuisine": "Italian", "rating": 4.5, "priceRange": "$$"}),
        json!({"name": "Sushi Zen", "cuisine": "Japanese", "rating": 4.8, "priceRange": "$$$"}),
        json!({"name": "Taco Fiesta", "cuisine": "Mexican", "rating": 4.2, "priceRange": "$"}),
        json!({"name": "Le Petit Bistro", "cuisine": "French", "rating": 4.7, "priceRange": "$$$"}),
    ]
}

/// Restaurant search by name or cuisine.
#[derive(Debug)]
pub struct RestaurantFinder {
    /// Search over the restaurants.
    search: SearchHandler,
}

impl RestaurantFinder {
    /// Construct the agent.
    pub fn new() -> Self {
        Self {
            search: SearchHandler::new("search", all_restaurants(), ["name", "cuisine"])
                .results_path("/restaurants"),
        }
    }
}

impl Default for RestaurantFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RestaurantFinder {
    fn surface_id(&self) -> &str {
        SURFACE_ID
    }

    fn initial_model(&self) -> Value {
        json!({"query": "", "restaurants": all_restaurants()})
    }

    fn components(&self) -> Vec<Component> {
        vec![
            Component::new("root", "Column").children([
                "header",
                "search-row",
                "divider1",
                "results-list",
            ]),
            Component::new("header", "Text")
                .text("Restaurant Finder")
                .variant("h2"),
            Component::new("search-row", "Row")
                .children(["search-field", "search-btn"])
                .gap("8")
                .set("align", "end"),
            Component::new("search-field", "TextField")
                .placeholder("Search restaurants...")
                .label("Search")
                .action("search"),
            Component::new("search-btn", "Button")
                .label("Search")
                .action("search"),
            Component::new("divider1", "Divider"),
            Component::new("results-list", "List").list("/restaurants", "restaurant-card"),
            Component::new("restaurant-card", "Card")
                .title("name")
                .children(["card-body"]),
            Component::new("card-body", "Row")
                .children(["card-cuisine", "card-rating", "card-price"])
                .set("justify", "spaceBetween"),
            Component::new("card-cuisine", "Text")
                .text("cuisine")
                .variant("body"),
            Component::new("card-rating", "Text")
                .text("rating")
                .variant("caption"),
            Component::new("card-price", "Text")
                .text("priceRange")
                .variant("caption"),
        ]
    }

    fn action_handler(&self) -> Option<&dyn ActionHandler> {
        Some(&self.search)
    }
}
