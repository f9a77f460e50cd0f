use std::path::{Path, PathBuf};
use std::{fs, io};

use common::crypto::{HashAlgorithm, HashError, KeyPair, PublicKey, SecretKey};
use common::group::{Group, GroupKeyShare, GroupKeyring};
use serde::{Deserialize, Serialize};

use crate::ledger_store::{FileLedgerError, FileLedgerProvider};

pub const APP_NAME: &str = "chainmail";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const PUBLIC_KEY_FILE_NAME: &str = "key.pub.pem";
pub const LEDGER_FILE_NAME: &str = "ledger.json";
pub const GROUPS_DIR_NAME: &str = "groups";
pub const CONTACTS_DIR_NAME: &str = "contacts";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name this installation signs and receives messages as
    pub identity: String,
    /// Digest algorithm for new messages (sha256 or sha3_256)
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,
    /// Default log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_hash_algorithm() -> String {
    HashAlgorithm::default().name().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            hash_algorithm: default_hash_algorithm(),
            log_level: default_log_level(),
        }
    }

    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, StateError> {
        Ok(self.hash_algorithm.parse()?)
    }
}

/// A share as handed to a member, with the group it claims to belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberShare {
    pub group: Group,
    pub share: GroupKeyShare,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the chainmail directory (~/.chainmail)
    pub dir: PathBuf,
    /// Path to the identity private key PEM file
    pub key_path: PathBuf,
    /// Path to the identity public key PEM file
    pub public_key_path: PathBuf,
    /// Path to the persisted ledger
    pub ledger_path: PathBuf,
    /// Path to group keyrings, group keys and imported shares
    pub groups_path: PathBuf,
    /// Path to known public keys, one `<name>.pub.pem` per contact
    pub contacts_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the chainmail directory path (custom or default ~/.chainmail)
    pub fn chainmail_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn paths(dir: PathBuf, config: AppConfig) -> Self {
        Self {
            key_path: dir.join(KEY_FILE_NAME),
            public_key_path: dir.join(PUBLIC_KEY_FILE_NAME),
            ledger_path: dir.join(LEDGER_FILE_NAME),
            groups_path: dir.join(GROUPS_DIR_NAME),
            contacts_path: dir.join(CONTACTS_DIR_NAME),
            config_path: dir.join(CONFIG_FILE_NAME),
            dir,
            config,
        }
    }

    /// Initialize a new state directory with a fresh identity key
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let dir = Self::chainmail_dir(custom_path)?;

        if dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }
        validate_name(&config.identity)?;
        config.hash_algorithm()?;

        fs::create_dir_all(&dir)?;
        let state = Self::paths(dir, config);
        fs::create_dir_all(&state.groups_path)?;
        fs::create_dir_all(&state.contacts_path)?;

        let keys = KeyPair::generate(Default::default());
        write_secret(&state.key_path, keys.secret.to_pem()?.as_bytes())?;
        fs::write(&state.public_key_path, keys.public.to_pem()?)?;

        fs::write(&state.config_path, toml::to_string_pretty(&state.config)?)?;
        fs::write(&state.ledger_path, "[]")?;

        Ok(state)
    }

    /// Load existing state from the chainmail directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dir = Self::chainmail_dir(custom_path)?;

        if !dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        let state = Self::paths(dir, config);
        if !state.key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !state.groups_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", GROUPS_DIR_NAME)));
        }
        if !state.contacts_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", CONTACTS_DIR_NAME)));
        }

        Ok(state)
    }

    /// Load the identity secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        read_secret_key(&self.key_path)
    }

    /// Open the persisted ledger
    pub async fn ledger(&self) -> Result<FileLedgerProvider, StateError> {
        Ok(FileLedgerProvider::open(&self.ledger_path).await?)
    }

    fn contact_path(&self, name: &str) -> Result<PathBuf, StateError> {
        validate_name(name)?;
        Ok(self.contacts_path.join(format!("{}.pub.pem", name)))
    }

    pub fn add_contact(&self, name: &str, key: &PublicKey) -> Result<PathBuf, StateError> {
        let path = self.contact_path(name)?;
        fs::write(&path, key.to_pem()?)?;
        Ok(path)
    }

    /// Names of every stored contact, sorted
    pub fn contacts(&self) -> Result<Vec<String>, StateError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.contacts_path)? {
            let file_name = entry?.file_name();
            if let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(".pub.pem")) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve an identity name to its public key
    ///
    /// Our own identity resolves to our own public key.
    pub fn public_key_of(&self, name: &str) -> Result<PublicKey, StateError> {
        if name == self.config.identity {
            return Ok(self.load_key()?.public());
        }
        let path = self.contact_path(name)?;
        if !path.exists() {
            return Err(StateError::UnknownContact(name.to_string()));
        }
        read_public_key(&path)
    }

    fn group_file(&self, group: &str, suffix: &str) -> Result<PathBuf, StateError> {
        validate_name(group)?;
        Ok(self.groups_path.join(format!("{}.{}", group, suffix)))
    }

    pub fn save_keyring(&self, keyring: &GroupKeyring) -> Result<(), StateError> {
        let path = self.group_file(&keyring.group().id, "keyring.json")?;
        fs::write(path, serde_json::to_string_pretty(keyring)?)?;
        Ok(())
    }

    pub fn load_keyring(&self, group: &str) -> Result<GroupKeyring, StateError> {
        let path = self.group_file(group, "keyring.json")?;
        if !path.exists() {
            return Err(StateError::UnknownGroup(group.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn has_keyring(&self, group: &str) -> Result<bool, StateError> {
        Ok(self.group_file(group, "keyring.json")?.exists())
    }

    /// Store the group private key held by the group's creator
    pub fn save_group_key(&self, group: &str, key: &SecretKey) -> Result<PathBuf, StateError> {
        let path = self.group_file(group, "key.pem")?;
        write_secret(&path, key.to_pem()?.as_bytes())?;
        Ok(path)
    }

    pub fn load_group_key(&self, group: &str) -> Result<SecretKey, StateError> {
        let path = self.group_file(group, "key.pem")?;
        if !path.exists() {
            return Err(StateError::UnknownGroup(group.to_string()));
        }
        read_secret_key(&path)
    }

    /// Store a share issued to us by another group's owner
    pub fn save_share(&self, share: &MemberShare) -> Result<PathBuf, StateError> {
        let path = self.group_file(&share.group.id, "share.json")?;
        fs::write(&path, serde_json::to_string_pretty(share)?)?;
        Ok(path)
    }

    /// Our share of `group`, from an owned keyring or an imported share
    pub fn load_share(&self, group: &str) -> Result<MemberShare, StateError> {
        let identity = &self.config.identity;
        if self.has_keyring(group)? {
            let keyring = self.load_keyring(group)?;
            if let Some(share) = keyring.share(identity) {
                return Ok(MemberShare {
                    group: keyring.group().clone(),
                    share: share.clone(),
                });
            }
        }

        let path = self.group_file(group, "share.json")?;
        if !path.exists() {
            return Err(StateError::NoShare {
                group: group.to_string(),
                member: identity.clone(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Group ids we own a keyring for, and ids we only hold a share of
    pub fn groups(&self) -> Result<(Vec<String>, Vec<String>), StateError> {
        let mut owned = Vec::new();
        let mut joined = Vec::new();
        for entry in fs::read_dir(&self.groups_path)? {
            let file_name = entry?.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(id) = name.strip_suffix(".keyring.json") {
                owned.push(id.to_string());
            } else if let Some(id) = name.strip_suffix(".share.json") {
                joined.push(id.to_string());
            }
        }
        owned.sort();
        joined.sort();
        Ok((owned, joined))
    }
}

/// Identity, contact and group names become file names
pub fn validate_name(name: &str) -> Result<(), StateError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(StateError::InvalidName(name.to_string()))
    }
}

pub fn read_secret_key(path: &Path) -> Result<SecretKey, StateError> {
    let pem = fs::read_to_string(path)?;
    SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
}

pub fn read_public_key(path: &Path) -> Result<PublicKey, StateError> {
    let pem = fs::read_to_string(path)?;
    PublicKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))
}

/// Write private key material readable by the owner only
pub fn write_secret(path: &Path, contents: &[u8]) -> Result<(), io::Error> {
    fs::write(path, contents)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("chainmail directory not initialized. Run 'chainmail init' first")]
    NotInitialized,

    #[error("chainmail directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid name {0:?}: use letters, digits, '-', '_', '.' or '@'")]
    InvalidName(String),

    #[error("unknown contact {0}. Add it with 'chainmail contact add'")]
    UnknownContact(String),

    #[error("unknown group {0}")]
    UnknownGroup(String),

    #[error("{member} holds no share of group {group}")]
    NoShare { group: String, member: String },

    #[error("key error: {0}")]
    Key(#[from] common::crypto::KeyError),

    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    #[error("ledger error: {0}")]
    Ledger(#[from] FileLedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
