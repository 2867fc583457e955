use crate::domain::principal::Principal;
use crate::error::{EconomyError, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Key used to derive the per-bot secret from the bot token.
const SECRET_DERIVATION_KEY: &[u8] = b"WebAppData";

/// Field carrying the hex signature inside init data.
pub const SIGNATURE_FIELD: &str = "hash";

/// Field carrying the JSON-encoded user.
pub const USER_FIELD: &str = "user";

/// Verifies Telegram WebApp init data and turns it into a [`Principal`].
///
/// The check string is every field except the signature, sorted by key and
/// joined as `key=value` lines. It is signed with
/// `HMAC-SHA256(HMAC-SHA256("WebAppData", bot_token), check_string)`.
#[derive(Clone)]
pub struct TelegramAuthenticator {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TelegramAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAuthenticator").finish_non_exhaustive()
    }
}

impl TelegramAuthenticator {
    pub fn new(bot_token: &str) -> Result<Self> {
        let mut mac = new_mac(SECRET_DERIVATION_KEY)?;
        mac.update(bot_token.as_bytes());
        Ok(Self {
            secret: mac.finalize().into_bytes().to_vec(),
        })
    }

    /// Authenticates a URL-encoded init data string.
    pub fn authenticate(&self, init_data: &str) -> Result<Principal> {
        let mut fields = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
            if fields.insert(key.to_string(), value.into_owned()).is_some() {
                return Err(EconomyError::Unauthorized(format!(
                    "duplicate field '{key}' in init data"
                )));
            }
        }

        let received = fields
            .remove(SIGNATURE_FIELD)
            .ok_or_else(|| EconomyError::Unauthorized("init data is not signed".into()))?;
        let received = hex::decode(received)
            .map_err(|_| EconomyError::Unauthorized("init data signature is not hex".into()))?;

        self.mac(&fields)?.verify_slice(&received).map_err(|_| {
            tracing::warn!("init data signature mismatch");
            EconomyError::Unauthorized("invalid init data signature".into())
        })?;

        let user = fields
            .get(USER_FIELD)
            .ok_or_else(|| EconomyError::Unauthorized("user not found in init data".into()))?;
        serde_json::from_str(user)
            .map_err(|e| EconomyError::Unauthorized(format!("invalid user data: {e}")))
    }

    /// Produces signed init data for `fields`. Used by tooling and tests.
    pub fn sign(&self, fields: &[(&str, &str)]) -> Result<String> {
        let map: BTreeMap<String, String> = fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let signature = self.signature(&map)?;

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &map {
            serializer.append_pair(key, value);
        }
        serializer.append_pair(SIGNATURE_FIELD, &signature);
        Ok(serializer.finish())
    }

    /// Signed init data carrying `principal` as its user.
    pub fn sign_principal(&self, principal: &Principal, auth_date: i64) -> Result<String> {
        let user = serde_json::to_string(principal)?;
        let auth_date = auth_date.to_string();
        self.sign(&[("auth_date", auth_date.as_str()), (USER_FIELD, user.as_str())])
    }

    fn signature(&self, fields: &BTreeMap<String, String>) -> Result<String> {
        Ok(hex::encode(self.mac(fields)?.finalize().into_bytes()))
    }

    /// MAC over the check string, ready to finalize or verify.
    fn mac(&self, fields: &BTreeMap<String, String>) -> Result<HmacSha256> {
        let check_string = fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut mac = new_mac(&self.secret)?;
        mac.update(check_string.as_bytes());
        Ok(mac)
    }
}

fn new_mac(key: &[u8]) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(key)
        .map_err(|e| EconomyError::InternalError(format!("HMAC error: {e}").into()))
}
