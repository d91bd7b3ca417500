use crate::judge::RecommendationCandidate;
use crate::products::ProductFacts;
use crate::users::repo::UserProfile;

fn patient_block(profile: &UserProfile) -> String {
    let comorbidities = if profile.comorbidities.is_empty() {
        "None".to_string()
    } else {
        profile.comorbidities.join(", ")
    };
    let preferences = if profile.preferences.is_empty() {
        "None"
    } else {
        profile.preferences.as_str()
    };
    format!(
        "Here is information about the patient:\n\
         Email: {}\n\
         Height (cm): {}\n\
         Weight (kg): {}\n\
         Age: {}\n\
         Physical Activity Level: {}\n\
         Gender: {}\n\
         Comorbidities: {}\n\
         Preferences: {}",
        profile.email,
        profile.height_cm,
        profile.weight_kg,
        profile.age,
        profile.physical_activity,
        profile.gender,
        comorbidities,
        preferences,
    )
}

fn or_unknown<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub(super) fn score_prompt(profile: &UserProfile, facts: &ProductFacts) -> String {
    format!(
        "You are a nutrition expert assessing how healthy a packaged food product is \
         for a specific patient.\n\n\
         {}\n\n\
         Here is what is known about the product (UPC {}):\n\
         Ingredients: {}\n\
         Nutri-Score points: {}\n\
         Nutri-Score grade: {}\n\
         NOVA processing group: {}\n\
         Allergens: {}\n\n\
         Give a score between 0-100 indicating how healthy this product is for this \
         patient, and a brief reasoning (2-3 sentences) tailored to their profile, \
         comorbidities and preferences.",
        patient_block(profile),
        facts.upc,
        or_unknown(&facts.ingredients_text),
        or_unknown(&facts.nutriscore_score),
        or_unknown(&facts.nutriscore_grade),
        or_unknown(&facts.nova_group),
        facts.allergens.as_deref().unwrap_or("None listed"),
    )
}

fn candidate_list(candidates: &[RecommendationCandidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            format!(
                "Food: {}\nUPC: {}\nScore: {}\nImage URL: {}\nDescription: {}",
                c.product_name, c.upc, c.score, c.image_url, c.reasoning
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(super) fn ranking_prompt(
    profile: &UserProfile,
    candidates: &[RecommendationCandidate],
) -> String {
    format!(
        "You are a nutrition expert tasked with ranking foods based on their \
         healthiness for a specific patient.\n\n\
         {}\n\n\
         Below is a list of foods the patient has scanned in the past:\n\n\
         {}\n\n\
         Analyze these foods and rank the top 3 healthiest options specifically for \
         this patient. For each recommended food, provide:\n\
         1. A score between 0-100 indicating how healthy it is for this patient\n\
         2. A brief reasoning (2-3 sentences) explaining why this food is recommended \
         for this specific patient\n\
         3. The food's name, image URL and UPC exactly as provided in the input\n\n\
         Consider the patient's health profile, comorbidities and preferences when \
         making recommendations. Focus on foods that would benefit this specific \
         patient's health situation.",
        patient_block(profile),
        candidate_list(candidates),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            email: "maria@example.com".into(),
            height_cm: 165.0,
            weight_kg: 61.0,
            age: 29,
            physical_activity: "High".into(),
            gender: "Female".into(),
            comorbidities: vec!["lactose intolerance".into()],
            preferences: "vegetarian".into(),
        }
    }

    #[test]
    fn score_prompt_includes_profile_and_facts() {
        let facts = ProductFacts {
            upc: "0123456789012".into(),
            product_name: Some("Crunchy Oat Granola".into()),
            ingredients_text: Some("oats, honey, almonds".into()),
            nutriscore_score: Some(-2),
            nutriscore_grade: Some("a".into()),
            nova_group: Some(3),
            allergens: Some("en:nuts".into()),
        };
        let prompt = score_prompt(&profile(), &facts);
        assert!(prompt.contains("maria@example.com"));
        assert!(prompt.contains("lactose intolerance"));
        assert!(prompt.contains("vegetarian"));
        assert!(prompt.contains("UPC 0123456789012"));
        assert!(prompt.contains("oats, honey, almonds"));
        assert!(prompt.contains("Nutri-Score grade: a"));
    }

    #[test]
    fn missing_facts_render_as_unknown() {
        let facts = ProductFacts {
            upc: "999".into(),
            product_name: None,
            ingredients_text: None,
            nutriscore_score: None,
            nutriscore_grade: None,
            nova_group: None,
            allergens: None,
        };
        let prompt = score_prompt(&profile(), &facts);
        assert!(prompt.contains("Ingredients: Unknown"));
        assert!(prompt.contains("Allergens: None listed"));
    }

    #[test]
    fn empty_comorbidities_render_as_none() {
        let mut p = profile();
        p.comorbidities.clear();
        p.preferences.clear();
        let block = patient_block(&p);
        assert!(block.contains("Comorbidities: None"));
        assert!(block.contains("Preferences: None"));
    }

    #[test]
    fn ranking_prompt_lists_every_candidate() {
        let candidates = vec![
            RecommendationCandidate {
                product_name: "Greek Yogurt".into(),
                upc: "111".into(),
                score: 82,
                image_url: "https://img.example/yogurt.jpg".into(),
                reasoning: "High protein, low sugar.".into(),
            },
            RecommendationCandidate {
                product_name: "Choco Bombs".into(),
                upc: "222".into(),
                score: 23,
                image_url: "https://img.example/choco.jpg".into(),
                reasoning: "Mostly sugar.".into(),
            },
        ];
        let prompt = ranking_prompt(&profile(), &candidates);
        assert!(prompt.contains("Food: Greek Yogurt"));
        assert!(prompt.contains("UPC: 222"));
        assert!(prompt.contains("Image URL: https://img.example/choco.jpg"));
        assert!(prompt.contains("top 3 healthiest"));
        assert!(prompt.contains("exactly as provided in the input"));
    }
}
