use futures_util::TryStreamExt;
use mongodb::{
    Collection,
    bson::{Bson, Document, doc, oid::ObjectId},
};
use quiz_schema::{QuestionDocument, db};

use crate::{
    config::EnvVars,
    repository::{QuestionStore, RepositoryError},
};

/// [`QuestionStore`] backed by a MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoQuestionStore {
    collection: Collection<QuestionDocument>,
}

impl MongoQuestionStore {
    pub fn new(collection: Collection<QuestionDocument>) -> Self {
        Self { collection }
    }

    #[tracing::instrument(skip_all, fields(collection = %env_vars.questions_collection), err(Debug))]
    pub async fn connect(env_vars: &EnvVars) -> mongodb::error::Result<Self> {
        let db_name = env_vars.mongodb_database.as_deref();
        let client = db::client(&env_vars.mongodb_uri, db_name, env_vars.database_timeout).await?;
        let database = db::database(&client, db_name);

        Ok(Self::new(db::get_collection(
            &database,
            &env_vars.questions_collection,
        )))
    }
}

/// Matches an opaque id against `_id` stored as a string, an ObjectId or an integer.
pub fn id_filter(id: &str) -> Document {
    let mut candidates = vec![Bson::String(id.to_string())];
    if let Ok(oid) = ObjectId::parse_str(id) {
        candidates.push(Bson::ObjectId(oid));
    }
    if let Ok(n) = id.parse::<i64>() {
        candidates.push(Bson::Int64(n));
    }
    doc! {"_id": {"$in": candidates}}
}

fn subject_filter(subject: Option<&str>) -> Document {
    match subject {
        Some(subject) => doc! {"subject": subject},
        None => doc! {},
    }
}

impl QuestionStore for MongoQuestionStore {
    async fn sample(
        &self,
        count: u32,
        subject: Option<&str>,
    ) -> Result<Vec<QuestionDocument>, RepositoryError> {
        let pipeline = [
            doc! {"$match": subject_filter(subject)},
            doc! {"$sample": {"size": i64::from(count)}},
        ];

        let documents: Vec<Document> = self
            .collection
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let questions = documents
            .into_iter()
            .filter_map(
                |document| match mongodb::bson::from_document::<QuestionDocument>(document) {
                    Ok(question) => Some(question),
                    Err(e) => {
                        tracing::warn!(error = ?e, "unable to deserialize question");
                        None
                    }
                },
            )
            .collect();
        Ok(questions)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<QuestionDocument>, RepositoryError> {
        let question = self.collection.find_one(id_filter(id)).await?;
        Ok(question)
    }

    async fn distinct_subjects(&self) -> Result<Vec<String>, RepositoryError> {
        let subjects = self
            .collection
            .distinct("subject", doc! {})
            .await?
            .into_iter()
            .filter_map(|subject| match subject {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect();
        Ok(subjects)
    }

    async fn count(&self, subject: Option<&str>) -> Result<u64, RepositoryError> {
        let count = self
            .collection
            .count_documents(subject_filter(subject))
            .await?;
        Ok(count)
    }
}
