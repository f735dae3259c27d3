//! `MongoDB` document store.
//!
//! Writes the bootstrap record in the shape the application server reads:
//! `_id` as an `ObjectId`, dates as BSON dates and the centroid as a
//! `[longitude, latitude]` array.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use super::DocumentStore;
use crate::error::{Error, Result};
use crate::record::{BootstrapRecord, Centroid, RecordId};

const STORE_NAME: &str = "mongodb";

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Application name reported to the server.
const APP_NAME: &str = "nrts-seed";

/// Document store backed by a `MongoDB` database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect to the server at `uri` and select `database`.
    ///
    /// The server is pinged once so an unreachable deployment is reported
    /// before any seeding work starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the URI cannot be parsed or no
    /// server answers within `server_selection_timeout`.
    pub async fn connect(
        uri: &str,
        database: &str,
        server_selection_timeout: Duration,
    ) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|err| Error::store_unavailable(STORE_NAME, err.to_string()))?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(server_selection_timeout);

        let client = Client::with_options(options)
            .map_err(|err| Error::store_unavailable(STORE_NAME, err.to_string()))?;
        let database = client.database(database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(read_error)?;

        info!("Connected to MongoDB database {}", database.name());
        Ok(Self { database })
    }

    /// Wrap an already configured database handle.
    #[must_use]
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn object_id(id: &RecordId) -> Result<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| Error::InvalidRecordId(id.to_string()))
}

fn bson_date(date: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(date.timestamp_millis())
}

/// Encode a record as a BSON document.
///
/// # Errors
///
/// Returns [`Error::InvalidRecordId`] if the identifier is not an object id.
pub fn to_document(record: &BootstrapRecord) -> Result<Document> {
    Ok(doc! {
        "_id": object_id(&record.id)?,
        "name": record.name.as_str(),
        "status": record.status.as_str(),
        "agency": record.agency.as_str(),
        "client": record.client.as_str(),
        "location": record.location.as_str(),
        "purpose": record.purpose.as_str(),
        "tags": record.tags.clone(),
        "areaHectares": record.area_hectares,
        "createdDate": bson_date(record.created_date),
        "publishDate": bson_date(record.publish_date),
        "isDeleted": record.is_deleted,
        "centroid": [record.centroid.longitude, record.centroid.latitude],
    })
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

/// Decode a BSON document into a record.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`] if a field is missing or has the wrong type.
pub fn from_document(document: &Document) -> Result<BootstrapRecord> {
    let oid = document
        .get_object_id("_id")
        .map_err(|err| Error::MalformedDocument {
            id: document
                .get("_id")
                .map_or_else(|| "<missing>".to_string(), ToString::to_string),
            message: err.to_string(),
        })?;
    let id = RecordId::parse(&oid.to_hex())?;
    let malformed = |field: &str, message: &str| Error::MalformedDocument {
        id: id.to_string(),
        message: format!("{field}: {message}"),
    };

    let text = |field: &str| {
        document
            .get_str(field)
            .map(str::to_string)
            .map_err(|err| malformed(field, &err.to_string()))
    };
    let date = |field: &str| {
        let value = document
            .get_datetime(field)
            .map_err(|err| malformed(field, &err.to_string()))?;
        DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
            .ok_or_else(|| malformed(field, "date out of range"))
    };

    let tags = document
        .get_array("tags")
        .map_err(|err| malformed("tags", &err.to_string()))?
        .iter()
        .map(|group| match group {
            Bson::Array(labels) => labels
                .iter()
                .map(|label| {
                    label
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| malformed("tags", "label is not a string"))
                })
                .collect::<Result<Vec<_>>>(),
            _ => Err(malformed("tags", "group is not an array")),
        })
        .collect::<Result<Vec<_>>>()?;

    let area_hectares = document
        .get("areaHectares")
        .and_then(as_f64)
        .ok_or_else(|| malformed("areaHectares", "expected a number"))?;

    let centroid = match document
        .get_array("centroid")
        .map_err(|err| malformed("centroid", &err.to_string()))?
        .as_slice()
    {
        [lon, lat] => match (as_f64(lon), as_f64(lat)) {
            (Some(longitude), Some(latitude)) => Centroid::new(longitude, latitude),
            _ => return Err(malformed("centroid", "coordinates must be numbers")),
        },
        _ => return Err(malformed("centroid", "expected [longitude, latitude]")),
    };

    Ok(BootstrapRecord {
        name: text("name")?,
        status: text("status")?,
        agency: text("agency")?,
        client: text("client")?,
        location: text("location")?,
        purpose: text("purpose")?,
        tags,
        area_hectares,
        created_date: date("createdDate")?,
        publish_date: date("publishDate")?,
        is_deleted: document
            .get_bool("isDeleted")
            .map_err(|err| malformed("isDeleted", &err.to_string()))?,
        centroid,
        id,
    })
}

/// Any failed read means the store could not answer.
fn read_error(err: mongodb::error::Error) -> Error {
    Error::store_unavailable(STORE_NAME, err.to_string())
}

fn write_error(collection: &str, id: &RecordId, err: &mongodb::error::Error) -> Error {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            Error::duplicate_key(collection, id.as_str())
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => {
            Error::store_unavailable(STORE_NAME, err.to_string())
        }
        _ => Error::write_failure(collection, err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn name(&self) -> &'static str {
        STORE_NAME
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<BootstrapRecord>> {
        let filter = doc! { "_id": object_id(id)? };
        let found = self
            .collection(collection)
            .find_one(filter)
            .await
            .map_err(read_error)?;
        found.as_ref().map(from_document).transpose()
    }

    async fn insert(&self, collection: &str, record: &BootstrapRecord) -> Result<()> {
        let document = to_document(record)?;
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|err| write_error(collection, &record.id, &err))?;
        debug!("Inserted document {} into {}", record.id, collection);
        Ok(())
    }

    async fn count_by_id(&self, collection: &str, id: &RecordId) -> Result<u64> {
        let filter = doc! { "_id": object_id(id)? };
        self.collection(collection)
            .count_documents(filter)
            .await
            .map_err(read_error)
    }
}
