#![allow(dead_code)]
use ctor::{ctor, dtor};
use mongo_provisioner::{
    config::Config, db::connection::create_client, models::account::AccountDescriptor,
    repositories::MongoUserAdmin,
};
use mongodb::{
    bson::{doc, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    Client,
};
use std::{
    env,
    net::TcpListener,
    path::Path,
    process::Command,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, OnceLock,
    },
    time::{SystemTime, UNIX_EPOCH},
};
use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage, RunnableImage};

static TESTCONTAINERS_DOCKER: OnceLock<&'static Cli> = OnceLock::new();
static TESTCONTAINERS_MONGO: OnceLock<Mutex<Option<Container<'static, GenericImage>>>> =
    OnceLock::new();
static TESTCONTAINERS_MONGO_URI: OnceLock<String> = OnceLock::new();
static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

const ROOT_USERNAME: &str = "provisioner_root";
const ROOT_PASSWORD: &str = "provisioner_root_pw";

#[ctor]
fn init_test_mongodb_uri() {
    if env::var("TEST_MONGODB_URI").is_ok() {
        return;
    }

    let uri = start_testcontainer_mongo();
    env::set_var("TEST_MONGODB_URI", uri);
}

fn start_testcontainer_mongo() -> String {
    TESTCONTAINERS_MONGO_URI
        .get_or_init(|| {
            ensure_docker_host();
            let docker = TESTCONTAINERS_DOCKER.get_or_init(|| Box::leak(Box::new(Cli::default())));
            let image_ref = env::var("TESTCONTAINERS_MONGO_IMAGE")
                .unwrap_or_else(|_| "mongo:7".to_string());
            let (image_name, image_tag) = image_ref
                .split_once(':')
                .unwrap_or((image_ref.as_str(), "latest"));
            let host_port = allocate_ephemeral_port();
            let image = GenericImage::new(image_name, image_tag)
                .with_env_var("MONGO_INITDB_ROOT_USERNAME", ROOT_USERNAME)
                .with_env_var("MONGO_INITDB_ROOT_PASSWORD", ROOT_PASSWORD)
                .with_wait_for(WaitFor::message_on_stdout(
                    "MongoDB init process complete; ready for start up.",
                ));
            let image = RunnableImage::from(image).with_mapped_port((host_port, 27017));
            let container = docker.run(image);
            let holder = TESTCONTAINERS_MONGO.get_or_init(|| Mutex::new(None));
            let mut guard = holder.lock().expect("lock testcontainers mongo");
            *guard = Some(container);
            let uri = format!(
                "mongodb://{}:{}@127.0.0.1:{}/?directConnection=true&authSource=admin",
                ROOT_USERNAME, ROOT_PASSWORD, host_port
            );
            eprintln!("--- Testcontainers MongoDB started at {} ---", uri);
            uri
        })
        .clone()
}

#[dtor]
fn shutdown_testcontainer_mongo() {
    if let Some(holder) = TESTCONTAINERS_MONGO.get() {
        if let Ok(mut guard) = holder.lock() {
            let _ = guard.take();
        }
    }
}

fn allocate_ephemeral_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("read socket addr")
        .port()
}

fn ensure_docker_host() {
    if env::var("DOCKER_HOST").is_ok() {
        return;
    }
    if Command::new("docker").arg("--version").output().is_ok() {
        return;
    }
    let podman_socket = Path::new("/run/podman/podman.sock");
    if podman_socket.exists() {
        env::set_var("DOCKER_HOST", "unix:///run/podman/podman.sock");
    }
}

pub fn test_mongodb_uri() -> String {
    env::var("TEST_MONGODB_URI").unwrap_or_else(|_| start_testcontainer_mongo())
}

/// A port nothing listens on, for exercising the unreachable-server path.
pub fn closed_port_uri() -> String {
    format!(
        "mongodb://127.0.0.1:{}/?directConnection=true",
        allocate_ephemeral_port()
    )
}

/// Database and user names unique to one test, so tests can share a server.
pub fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let n = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}_{}_{}", prefix, std::process::id(), nanos, n)
}

pub fn test_config(account: AccountDescriptor) -> Config {
    Config {
        admin_uri: test_mongodb_uri(),
        server_selection_timeout_secs: 10,
        account,
    }
}

pub async fn test_admin() -> MongoUserAdmin {
    let config = test_config(AccountDescriptor::new("admin", "unused", "unused"));
    let client = create_client(&config).await.expect("create admin client");
    MongoUserAdmin::new(client)
}

/// Connection string that logs in as `username` against `database`, on the
/// same host as the administrative URI.
pub fn account_uri(username: &str, password: &str, database: &str) -> String {
    let admin_uri = test_mongodb_uri();
    let rest = admin_uri
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(admin_uri.as_str());
    let rest = rest.rsplit_once('@').map(|(_, host)| host).unwrap_or(rest);
    let hosts = rest.split(['/', '?']).next().unwrap_or(rest);
    format!(
        "mongodb://{}:{}@{}/?directConnection=true&authSource={}&serverSelectionTimeoutMS=5000",
        username, password, hosts, database
    )
}

pub async fn account_client(username: &str, password: &str, database: &str) -> Client {
    Client::with_uri_str(account_uri(username, password, database))
        .await
        .expect("create account client")
}

/// Inserts one marker document into `database` using `client`.
pub async fn insert_marker(client: &Client, database: &str) -> Result<(), MongoError> {
    client
        .database(database)
        .collection::<Document>("provisioning_marker")
        .insert_one(doc! { "written_by": "provisioned_account" })
        .await?;
    Ok(())
}

/// Numeric server code carried by a command or write error.
pub fn server_error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        _ => None,
    }
}

pub fn is_authentication_failure(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Authentication { .. })
        || server_error_code(err) == Some(18)
}
