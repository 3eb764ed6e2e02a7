//! PostgREST-backed [`DataService`].

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{DataError, DataResult, DataService};
use crate::config::BusinessConfig;
use crate::http::{Client, RequestBuilder, Response};
use crate::models::{
    ClothingItem, ClothingType, GeneratedPhoto, NewClothingItem, NewGeneratedPhoto, NewSavedOutfit,
    PreferencesUpdate, SavedOutfit, UserPhoto, UserPreferences,
};

const CLOTHING_ITEMS: &str = "clothing_items";
const SAVED_OUTFITS: &str = "saved_outfits";
const GENERATED_PHOTOS: &str = "generated_photos";
const USER_PHOTOS: &str = "user_photos";
const USER_PREFERENCES: &str = "user_preferences";

const RETURN_REPRESENTATION: &str = "return=representation";
const UPSERT: &str = "resolution=merge-duplicates,return=representation";

/// Postgres codes PostgREST passes through for constraint violations.
const CONSTRAINT_CODES: [&str; 4] = ["23505", "23503", "23514", "23502"];

#[derive(Debug, Clone)]
pub struct RestDataService {
    config: BusinessConfig,
    access_token: String,
}

#[derive(Serialize)]
struct TagsPatch<'a> {
    tags: &'a [String],
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
struct RatingPatch {
    rating: Option<u8>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
struct UserPhotoUpsert<'a> {
    user_id: Uuid,
    image_url: &'a str,
    updated_at: chrono::DateTime<Utc>,
}

impl RestDataService {
    pub fn new(config: BusinessConfig, access_token: impl Into<String>) -> Self {
        Self {
            config,
            access_token: access_token.into(),
        }
    }

    fn table(&self, table: &str, query: &str) -> String {
        let url = self.config.rest_url(table);
        if query.is_empty() {
            url
        } else {
            format!("{url}?{query}")
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.config.supabase_anon_key.as_str())
            .bearer(&self.access_token)
    }

    async fn rows<T: DeserializeOwned>(&self, builder: RequestBuilder) -> DataResult<Vec<T>> {
        let url = builder.url().to_owned();
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| DataError::Connection(e.message))?;

        if !response.is_success() {
            let err = api_error(&response);
            log::error!("PostgREST request to {url} failed: {err}");
            return Err(err);
        }
        if response.body.is_empty() {
            return Ok(Vec::new());
        }
        response.json().map_err(|e| DataError::Decode(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> DataResult<Vec<T>> {
        self.rows(Client::get(self.table(table, query))).await
    }

    async fn write<T, B>(
        &self,
        builder: RequestBuilder,
        prefer: &str,
        body: &B,
    ) -> DataResult<Vec<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let builder = builder
            .header("prefer", prefer)
            .json(body)
            .map_err(|e| DataError::Decode(e.to_string()))?;
        self.rows(builder).await
    }

    async fn delete(&self, table: &str, query: &str) -> DataResult<()> {
        self.rows::<serde_json::Value>(Client::delete(self.table(table, query)))
            .await
            .map(|_| ())
    }
}

fn api_error(response: &Response) -> DataError {
    let message = response.error_message();
    let code = response
        .json::<serde_json::Value>()
        .ok()
        .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_owned));

    match code {
        Some(code) if CONSTRAINT_CODES.contains(&code.as_str()) => DataError::Constraint(message),
        _ if response.status == 409 => DataError::Constraint(message),
        _ => DataError::Api {
            status: response.status,
            message,
        },
    }
}

fn single<T>(rows: Vec<T>, table: &'static str, id: Uuid) -> DataResult<T> {
    rows.into_iter()
        .next()
        .ok_or(DataError::NotFound { table, id })
}

impl DataService for RestDataService {
    async fn list_clothing_items(
        &self,
        user_id: Uuid,
        clothing_type: Option<ClothingType>,
    ) -> DataResult<Vec<ClothingItem>> {
        let mut query = format!("select=*&user_id=eq.{user_id}&order=created_at.desc");
        if let Some(kind) = clothing_type {
            query.push_str(&format!("&type=eq.{kind}"));
        }
        self.select(CLOTHING_ITEMS, &query).await
    }

    async fn get_clothing_item(&self, id: Uuid) -> DataResult<Option<ClothingItem>> {
        let rows = self
            .select(CLOTHING_ITEMS, &format!("select=*&id=eq.{id}"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_clothing_item(&self, item: NewClothingItem) -> DataResult<ClothingItem> {
        let id = item.id;
        let rows = self
            .write(
                Client::post(self.table(CLOTHING_ITEMS, "")),
                RETURN_REPRESENTATION,
                &item,
            )
            .await?;
        single(rows, CLOTHING_ITEMS, id)
    }

    async fn update_clothing_tags(&self, id: Uuid, tags: Vec<String>) -> DataResult<ClothingItem> {
        let patch = TagsPatch {
            tags: &tags,
            updated_at: Utc::now(),
        };
        let rows = self
            .write(
                Client::patch(self.table(CLOTHING_ITEMS, &format!("id=eq.{id}"))),
                RETURN_REPRESENTATION,
                &patch,
            )
            .await?;
        single(rows, CLOTHING_ITEMS, id)
    }

    async fn delete_clothing_item(&self, id: Uuid) -> DataResult<()> {
        self.delete(CLOTHING_ITEMS, &format!("id=eq.{id}")).await
    }

    async fn list_saved_outfits(&self, user_id: Uuid) -> DataResult<Vec<SavedOutfit>> {
        self.select(
            SAVED_OUTFITS,
            &format!("select=*&user_id=eq.{user_id}&order=created_at.desc"),
        )
        .await
    }

    async fn insert_saved_outfit(&self, outfit: NewSavedOutfit) -> DataResult<SavedOutfit> {
        let user_id = outfit.user_id;
        let rows = self
            .write(
                Client::post(self.table(SAVED_OUTFITS, "")),
                RETURN_REPRESENTATION,
                &outfit,
            )
            .await?;
        single(rows, SAVED_OUTFITS, user_id)
    }

    async fn update_outfit_rating(&self, id: Uuid, rating: Option<u8>) -> DataResult<SavedOutfit> {
        let patch = RatingPatch {
            rating,
            updated_at: Utc::now(),
        };
        let rows = self
            .write(
                Client::patch(self.table(SAVED_OUTFITS, &format!("id=eq.{id}"))),
                RETURN_REPRESENTATION,
                &patch,
            )
            .await?;
        single(rows, SAVED_OUTFITS, id)
    }

    async fn delete_saved_outfit(&self, id: Uuid) -> DataResult<()> {
        self.delete(SAVED_OUTFITS, &format!("id=eq.{id}")).await
    }

    async fn list_generated_photos(&self, outfit_id: Uuid) -> DataResult<Vec<GeneratedPhoto>> {
        self.select(
            GENERATED_PHOTOS,
            &format!("select=*&outfit_id=eq.{outfit_id}&order=created_at.desc"),
        )
        .await
    }

    async fn insert_generated_photo(&self, photo: NewGeneratedPhoto) -> DataResult<GeneratedPhoto> {
        let id = photo.id;
        let rows = self
            .write(
                Client::post(self.table(GENERATED_PHOTOS, "")),
                RETURN_REPRESENTATION,
                &photo,
            )
            .await?;
        single(rows, GENERATED_PHOTOS, id)
    }

    async fn delete_generated_photos_for_outfit(
        &self,
        outfit_id: Uuid,
    ) -> DataResult<Vec<GeneratedPhoto>> {
        let builder = Client::delete(self.table(GENERATED_PHOTOS, &format!("outfit_id=eq.{outfit_id}")))
            .header("prefer", RETURN_REPRESENTATION);
        self.rows(builder).await
    }

    async fn get_user_photo(&self, user_id: Uuid) -> DataResult<Option<UserPhoto>> {
        let rows = self
            .select(USER_PHOTOS, &format!("select=*&user_id=eq.{user_id}"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_user_photo(&self, user_id: Uuid, image_url: String) -> DataResult<UserPhoto> {
        let body = UserPhotoUpsert {
            user_id,
            image_url: &image_url,
            updated_at: Utc::now(),
        };
        let rows = self
            .write(
                Client::post(self.table(USER_PHOTOS, "on_conflict=user_id")),
                UPSERT,
                &body,
            )
            .await?;
        single(rows, USER_PHOTOS, user_id)
    }

    async fn delete_user_photo(&self, user_id: Uuid) -> DataResult<()> {
        self.delete(USER_PHOTOS, &format!("user_id=eq.{user_id}")).await
    }

    async fn get_preferences(&self, user_id: Uuid) -> DataResult<Option<UserPreferences>> {
        let rows = self
            .select(USER_PREFERENCES, &format!("select=*&user_id=eq.{user_id}"))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_preferences(&self, update: PreferencesUpdate) -> DataResult<UserPreferences> {
        let user_id = update.user_id;
        let rows = self
            .write(
                Client::post(self.table(USER_PREFERENCES, "on_conflict=user_id")),
                UPSERT,
                &update,
            )
            .await?;
        single(rows, USER_PREFERENCES, user_id)
    }
}
