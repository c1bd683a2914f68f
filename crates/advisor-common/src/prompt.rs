use crate::catalog::Catalog;
use crate::model::UserPreferences;

const RESPONSE_SCHEMA: &str = r#"{
  "recommendations": [
    {
      "product": {
        "brand": "exact brand from catalog",
        "product_name": "exact product name from catalog",
        "price": exact_price_number,
        "category": "exact category from catalog",
        "description": "exact description from catalog"
      },
      "reasoning": "detailed explanation of why this product matches the user's needs",
      "matchScore": 9,
      "pros": ["specific pro 1", "specific pro 2", "specific pro 3"],
      "cons": ["potential concern 1", "potential concern 2"]
    }
  ],
  "summary": "A brief summary of what the user was looking for and the general recommendation approach",
  "totalMatches": 3
}"#;

const GUIDELINES: &str = "Important guidelines:
- Only recommend products that actually exist in the catalog
- Use exact product details (brand, name, price, category, description) from the catalog
- Be specific about why each product matches their needs
- Consider price, features, category, and use case
- Prioritize the best matches first
- Be honest about limitations or potential downsides";

/// Build the advisor prompt for `query` over the whole catalog.
///
/// The query is embedded verbatim and the catalog is embedded in full, in catalog order.
pub fn build_prompt(query: &str, catalog: &Catalog) -> String {
    build_prompt_with_preferences(query, catalog, &UserPreferences::default())
}

/// Same as [`build_prompt`], plus a preferences block when `preferences` is non-empty.
pub fn build_prompt_with_preferences(
    query: &str,
    catalog: &Catalog,
    preferences: &UserPreferences,
) -> String {
    let mut prompt = format!(
        "You are an expert product advisor. A customer has described their needs: \"{query}\"\n\n\
Here is our product catalog:\n{catalog}\n\n",
        catalog = catalog.serialized(),
    );

    if let Some(block) = preferences_block(preferences) {
        prompt.push_str(&block);
        prompt.push('\n');
    }

    prompt.push_str(
        "Your task is to recommend the best 3-5 products that match their needs. \
For each recommendation, provide:\n\n\
1. The exact product details from the catalog\n\
2. A clear explanation of why this product matches their needs\n\
3. 2-3 specific pros for this customer's use case\n\
4. 1-2 potential cons or considerations\n\
5. A match score out of 10\n\n\
Please respond in this exact JSON format:\n",
    );
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push_str("\n\n");
    prompt.push_str(GUIDELINES);
    prompt.push('\n');
    prompt
}

fn preferences_block(preferences: &UserPreferences) -> Option<String> {
    if preferences.is_empty() {
        return None;
    }

    let mut block = String::from("Customer preferences:\n");
    if let Some((min, max)) = preferences.budget_range {
        block.push_str(&format!("- Budget range: {min} to {max}\n"));
    }
    if !preferences.preferred_categories.is_empty() {
        block.push_str(&format!(
            "- Preferred categories: {}\n",
            preferences.preferred_categories.join(", ")
        ));
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_query_and_full_catalog() {
        let catalog = Catalog::builtin().unwrap();
        let query = "noise-cancelling headphones for \"long\" flights under $400";
        let prompt = build_prompt(query, &catalog);

        assert!(prompt.contains(query));
        assert!(prompt.contains(catalog.serialized()));
        assert!(prompt.contains("\"recommendations\""));
        assert!(prompt.contains("\"totalMatches\""));
        assert!(prompt.contains("Only recommend products that actually exist in the catalog"));
        assert!(!prompt.contains("Customer preferences"));
    }

    #[test]
    fn catalog_order_is_preserved() {
        let catalog = Catalog::builtin().unwrap();
        let prompt = build_prompt("anything", &catalog);
        let positions: Vec<usize> = catalog
            .products()
            .iter()
            .map(|p| {
                let needle = serde_json::to_string(&p.product_name).unwrap();
                prompt.find(&needle).expect("product missing from prompt")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn preferences_add_a_block() {
        let catalog = Catalog::builtin().unwrap();
        let preferences = UserPreferences {
            budget_range: Some((100.0, 500.0)),
            preferred_categories: vec!["Headphones".to_string(), "Wearables".to_string()],
        };
        let prompt = build_prompt_with_preferences("gift ideas", &catalog, &preferences);
        assert!(prompt.contains("Customer preferences:"));
        assert!(prompt.contains("- Budget range: 100 to 500"));
        assert!(prompt.contains("- Preferred categories: Headphones, Wearables"));
        assert!(prompt.contains(catalog.serialized()));
    }
}
