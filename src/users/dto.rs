use serde::{Deserialize, Serialize};

use crate::users::repo::UserProfile;

/// Body for POST /users.
#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: i32,
    pub physical_activity: String,
    pub gender: String,
    #[serde(default)]
    pub comorbidities: Vec<String>,
    #[serde(default)]
    pub preferences: String,
}

/// Body for PUT /users/:email. The email comes from the path.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: i32,
    pub physical_activity: String,
    pub gender: String,
    #[serde(default)]
    pub comorbidities: Vec<String>,
    #[serde(default)]
    pub preferences: String,
}

/// Profile as returned to clients.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: i32,
    pub physical_activity: String,
    pub gender: String,
    pub comorbidities: Vec<String>,
    pub preferences: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            email: profile.email,
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            age: profile.age,
            physical_activity: profile.physical_activity,
            gender: profile.gender,
            comorbidities: profile.comorbidities,
            preferences: profile.preferences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_defaults_optional_fields() {
        let payload: RegisterProfileRequest = serde_json::from_str(
            r#"{
                "email": "a@b.c",
                "height_cm": 180.0,
                "weight_kg": 75.0,
                "age": 33,
                "physical_activity": "Moderate",
                "gender": "Male"
            }"#,
        )
        .expect("deserialize register request");
        assert!(payload.comorbidities.is_empty());
        assert!(payload.preferences.is_empty());
    }

    #[test]
    fn profile_response_mirrors_the_profile() {
        let profile = UserProfile::default_for("a@b.c");
        let response = ProfileResponse::from(profile.clone());
        let json = serde_json::to_value(&response).expect("serialize response");
        assert_eq!(json["email"], "a@b.c");
        assert_eq!(json["age"], profile.age);
        assert_eq!(json["physical_activity"], "Moderate");
    }
}
