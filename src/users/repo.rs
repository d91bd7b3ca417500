use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};

/// Health profile for one registered user, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: i32,
    pub physical_activity: String,
    pub gender: String,
    pub comorbidities: Vec<String>,
    pub preferences: String,
}

impl UserProfile {
    /// Neutral defaults used when a scan arrives for an email nobody
    /// registered. Kept in one place so every path synthesizes the same
    /// profile.
    pub fn default_for(email: &str) -> Self {
        Self {
            email: email.to_string(),
            height_cm: 170.0,
            weight_kg: 70.0,
            age: 35,
            physical_activity: "Moderate".into(),
            gender: "Unspecified".into(),
            comorbidities: Vec::new(),
            preferences: String::new(),
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    email: String,
    height_cm: f64,
    weight_kg: f64,
    age: i32,
    physical_activity: String,
    gender: String,
    comorbidities: Json<Vec<String>>,
    preferences: String,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            email: row.email,
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            age: row.age,
            physical_activity: row.physical_activity,
            gender: row.gender,
            comorbidities: row.comorbidities.0,
            preferences: row.preferences,
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, email: &str) -> anyhow::Result<Option<UserProfile>>;
    async fn create(&self, profile: &UserProfile) -> anyhow::Result<()>;
    /// Full replacement. Returns false when no profile exists for the email.
    async fn update(&self, profile: &UserProfile) -> anyhow::Result<bool>;
    async fn list(&self) -> anyhow::Result<Vec<UserProfile>>;
}

pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, email: &str) -> anyhow::Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT email, height_cm, weight_kg, age, physical_activity, gender,
                   comorbidities, preferences
            FROM profiles
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn create(&self, profile: &UserProfile) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (email, height_cm, weight_kg, age, physical_activity,
                                  gender, comorbidities, preferences)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&profile.email)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.age)
        .bind(&profile.physical_activity)
        .bind(&profile.gender)
        .bind(Json(&profile.comorbidities))
        .bind(&profile.preferences)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update(&self, profile: &UserProfile) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET height_cm = $2, weight_kg = $3, age = $4, physical_activity = $5,
                gender = $6, comorbidities = $7, preferences = $8
            WHERE email = $1
            "#,
        )
        .bind(&profile.email)
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.age)
        .bind(&profile.physical_activity)
        .bind(&profile.gender)
        .bind(Json(&profile.comorbidities))
        .bind(&profile.preferences)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> anyhow::Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT email, height_cm, weight_kg, age, physical_activity, gender,
                   comorbidities, preferences
            FROM profiles
            ORDER BY email
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_neutral() {
        let profile = UserProfile::default_for("new@example.com");
        assert_eq!(profile.email, "new@example.com");
        assert_eq!(profile.height_cm, 170.0);
        assert_eq!(profile.weight_kg, 70.0);
        assert_eq!(profile.age, 35);
        assert_eq!(profile.physical_activity, "Moderate");
        assert_eq!(profile.gender, "Unspecified");
        assert!(profile.comorbidities.is_empty());
        assert!(profile.preferences.is_empty());
    }

    #[test]
    fn row_mapping_unwraps_comorbidities() {
        let row = ProfileRow {
            email: "a@b.c".into(),
            height_cm: 180.0,
            weight_kg: 82.5,
            age: 41,
            physical_activity: "High".into(),
            gender: "Male".into(),
            comorbidities: Json(vec!["diabetes".into(), "hypertension".into()]),
            preferences: "low sugar".into(),
        };
        let profile = UserProfile::from(row);
        assert_eq!(profile.comorbidities, vec!["diabetes", "hypertension"]);
        assert_eq!(profile.preferences, "low sugar");
    }
}
