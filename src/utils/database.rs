use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};

#[derive(Clone)]
pub struct DatabaseConnection {
    pub db: Database,
}

impl DatabaseConnection {
    pub fn collection<T>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

pub async fn connect(database_url: &str, database_name: &str) -> DatabaseConnection {
    let options = ClientOptions::parse(database_url)
        .await
        .unwrap_or_else(|err| {
            tracing::error!("{:}", err);
            panic!("Invalid database connection string {}", database_url)
        });

    let client = Client::with_options(options).unwrap_or_else(|err| {
        tracing::error!("{:}", err);
        panic!("Error connecting to database {}", database_url)
    });

    DatabaseConnection {
        db: client.database(database_name),
    }
}

/// Ensures the unique indexes the application relies on for idempotency:
/// one user per email, one payment per provider transaction id, one pending
/// role request per email and one favorite per (owner, meal) pair.
pub async fn migrate(db_conn: DatabaseConnection) {
    let indexes = [
        (
            "users",
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ),
        (
            "payments",
            IndexModel::builder()
                .keys(doc! { "transaction_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ),
        (
            "role_requests",
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "status": "PENDING" })
                        .build(),
                )
                .build(),
        ),
        (
            "favorites",
            IndexModel::builder()
                .keys(doc! { "owner_email": 1, "meal_id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ),
    ];

    for (collection, index) in indexes {
        match db_conn
            .collection::<mongodb::bson::Document>(collection)
            .create_index(index, None)
            .await
        {
            Ok(_) => (),
            Err(err) => {
                tracing::error!("{}", err);
                panic!("Failed to create indexes on {}", collection);
            }
        }
    }
}

pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}
