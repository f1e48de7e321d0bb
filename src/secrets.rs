use aes::Aes256;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

const KDF_SALT: &str = "banca_terminal.credentials.v1";
const KDF_ITERATIONS: u32 = 10_000;

/// Connection credentials for the hosted row store, kept on disk only in
/// encrypted form. Wire shape of the blob: base64 over
/// `<base64 ciphertext>:<hex iv>`, AES-256-CBC with a PBKDF2-derived key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

pub fn decrypt_credentials(blob: &str, passphrase: &str) -> Result<StoreCredentials> {
    let plaintext = decrypt_blob(blob, passphrase)?;
    serde_json::from_str(&plaintext).context("credentials payload is not the expected json")
}

pub fn encrypt_credentials(creds: &StoreCredentials, passphrase: &str) -> Result<String> {
    let plaintext = serde_json::to_string(creds).context("serialize credentials")?;
    let iv: [u8; 16] = rand::random();
    encrypt_blob(&plaintext, passphrase, &iv)
}

fn derive_key(passphrase: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        KDF_SALT.as_bytes(),
        KDF_ITERATIONS,
        &mut key,
    );
    key
}

fn decrypt_blob(blob: &str, passphrase: &str) -> Result<String> {
    let decoded = BASE64
        .decode(blob.trim().as_bytes())
        .context("outer base64 decode failed")?;
    let decoded_str = String::from_utf8(decoded).context("outer base64 not utf8")?;

    let (ct_b64, iv_hex) = decoded_str
        .rsplit_once(':')
        .context("expected ciphertext:iv format")?;

    let ciphertext = BASE64
        .decode(ct_b64.as_bytes())
        .context("ciphertext base64 decode failed")?;
    let iv = hex_decode(iv_hex).context("iv hex decode failed")?;
    if iv.len() != 16 {
        return Err(anyhow!("IV must be 16 bytes, got {}", iv.len()));
    }

    let key = derive_key(passphrase);
    let mut buf = ciphertext.clone();
    let iv_arr: [u8; 16] = iv.try_into().unwrap();
    let decryptor = Aes256CbcDec::new(&key.into(), &iv_arr.into());
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| anyhow!("AES decrypt failed: {e}"))?;

    String::from_utf8(plaintext.to_vec()).context("decrypted payload is not utf8")
}

fn encrypt_blob(plaintext: &str, passphrase: &str, iv: &[u8; 16]) -> Result<String> {
    let key = derive_key(passphrase);
    let msg = plaintext.as_bytes();
    let mut buf = vec![0u8; msg.len() + 16];
    buf[..msg.len()].copy_from_slice(msg);
    let encryptor = Aes256CbcEnc::new(&key.into(), iv.into());
    let ciphertext = encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buf, msg.len())
        .map_err(|e| anyhow!("AES encrypt failed: {e}"))?;

    let inner = format!("{}:{}", BASE64.encode(ciphertext), hex_encode(iv));
    Ok(BASE64.encode(inner.as_bytes()))
}

fn hex_decode(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(anyhow!("odd-length hex string"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| anyhow!("invalid hex byte at offset {i}"))
        })
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_round_trip() {
        let creds = StoreCredentials {
            url: "https://store.example".to_string(),
            key: "service-key-123".to_string(),
        };
        let blob = encrypt_credentials(&creds, "hunter2").unwrap();
        let back = decrypt_credentials(&blob, "hunter2").unwrap();
        assert_eq!(back.url, creds.url);
        assert_eq!(back.key, creds.key);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let creds = StoreCredentials {
            url: "https://store.example".to_string(),
            key: "service-key-123".to_string(),
        };
        let blob = encrypt_credentials(&creds, "hunter2").unwrap();
        assert!(decrypt_credentials(&blob, "hunter3").is_err());
    }

    #[test]
    fn garbage_blob_fails_cleanly() {
        assert!(decrypt_credentials("not base64!!", "x").is_err());
        assert!(decrypt_credentials(&BASE64.encode("no-separator"), "x").is_err());
    }

    #[test]
    fn hex_round_trip() {
        let bytes = [0u8, 15, 255, 128];
        assert_eq!(hex_decode(&hex_encode(&bytes)).unwrap(), bytes);
        assert!(hex_decode("abc").is_err());
    }
}
