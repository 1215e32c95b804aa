use chrono::Utc;
use futures::StreamExt;

use crate::collaborators::DiaryContext;
use crate::document_id::create_id;
use crate::error::{DiaryError, DiaryResult, StoreResult};
use crate::models::{Recipe, RecipeDraft};
use crate::path;
use crate::store::{decode, encode, watch_document, Direction, LiveStream, Query, Snapshot};

#[derive(Clone)]
pub struct RecipeService {
    ctx: DiaryContext,
}

impl RecipeService {
    pub fn new(ctx: DiaryContext) -> Self {
        Self { ctx }
    }

    pub async fn get(&self, recipe_id: &str) -> DiaryResult<Option<Recipe>> {
        let doc_path = path::recipe(recipe_id)?;
        match self.ctx.store.get(&doc_path).await? {
            Some(value) => Ok(Some(decode(&doc_path, value)?)),
            None => Ok(None),
        }
    }

    pub fn watch(&self, recipe_id: &str) -> DiaryResult<LiveStream<Option<Recipe>>> {
        let doc_path = path::recipe(recipe_id)?;
        let decode_path = doc_path.clone();
        Ok(watch_document(self.ctx.store.clone(), doc_path)
            .map(move |item| {
                item.and_then(|value| value.map(|v| decode(&decode_path, v)).transpose())
            })
            .boxed())
    }

    pub async fn create(&self, author_id: &str, draft: RecipeDraft) -> DiaryResult<Recipe> {
        draft.validate()?;
        let recipe = Recipe::new(create_id(), author_id, draft);
        let doc_path = path::recipe(&recipe.recipe_id)?;
        self.ctx.store.set(&doc_path, encode(&doc_path, &recipe)?).await?;
        self.ctx.notify("Recipe created");
        self.ctx.navigator.go_back();
        Ok(recipe)
    }

    /// Replaces the content of a recipe owned by `user_id`.
    pub async fn update(
        &self,
        user_id: &str,
        recipe_id: &str,
        draft: RecipeDraft,
    ) -> DiaryResult<Recipe> {
        draft.validate()?;
        let mut recipe = self.owned(user_id, recipe_id).await?;
        recipe.content = draft;
        recipe.updated_at = Utc::now();

        let doc_path = path::recipe(recipe_id)?;
        self.ctx.store.set(&doc_path, encode(&doc_path, &recipe)?).await?;
        self.ctx.notify("Recipe updated");
        Ok(recipe)
    }

    pub async fn delete(&self, user_id: &str, recipe_id: &str) -> DiaryResult<()> {
        self.owned(user_id, recipe_id).await?;
        self.ctx.store.delete(&path::recipe(recipe_id)?).await?;
        Ok(())
    }

    /// Public recipes, most recently updated first.
    pub async fn list_public(&self) -> DiaryResult<Vec<Recipe>> {
        let query = Query::new(path::recipes())
            .where_eq("public", true)
            .order_by("updatedAt", Direction::Desc);
        self.list(&query).await
    }

    pub async fn list_by_author(&self, author_id: &str) -> DiaryResult<Vec<Recipe>> {
        let query = Query::new(path::recipes())
            .where_eq("authorId", author_id)
            .order_by("updatedAt", Direction::Desc);
        self.list(&query).await
    }

    async fn list(&self, query: &Query) -> DiaryResult<Vec<Recipe>> {
        let snapshots = self.ctx.store.query(query).await?;
        let recipes = snapshots
            .iter()
            .map(Snapshot::decode::<Recipe>)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(recipes)
    }

    async fn owned(&self, user_id: &str, recipe_id: &str) -> DiaryResult<Recipe> {
        let recipe = self.get(recipe_id).await?.ok_or_else(|| DiaryError::NotFound {
            kind: "recipe",
            id: recipe_id.to_string(),
        })?;
        if recipe.author_id != user_id {
            return Err(DiaryError::NotAuthor {
                user_id: user_id.to_string(),
                recipe_id: recipe_id.to_string(),
            });
        }
        Ok(recipe)
    }
}
