//! Builders for real, signed BOLT11 invoices. Test support only.

use bech32::primitives::iter::Fe32IterExt;
use bech32::{Bech32, Fe32, Hrp};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use crate::bolt11::{
    TAG_DESCRIPTION, TAG_EXPIRY, TAG_PAYEE, TAG_PAYMENT_HASH, TAG_PAYMENT_SECRET, TIMESTAMP_FES,
    bytes_to_fes, signing_digest,
};
use crate::network::Network;

#[derive(Debug, thiserror::Error)]
#[error("test invoice: {0}")]
pub struct TestInvoiceError(String);

/// Signs invoices with a throwaway key.
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    network: Network,
    secret_key: SecretKey,
    amount: Option<String>,
    timestamp: u64,
    payment_hash: [u8; 32],
    include_payment_hash: bool,
    description: Option<String>,
    expiry: Option<u64>,
    payee_field: Option<PublicKey>,
}

impl InvoiceBuilder {
    pub fn new(network: Network) -> Result<Self, TestInvoiceError> {
        Self::with_secret(network, [0x42; 32])
    }

    pub fn with_secret(network: Network, secret: [u8; 32]) -> Result<Self, TestInvoiceError> {
        let secret_key =
            SecretKey::from_slice(&secret).map_err(|error| TestInvoiceError(error.to_string()))?;
        Ok(Self {
            network,
            secret_key,
            amount: None,
            timestamp: 1_496_314_658,
            payment_hash: [0x01; 32],
            include_payment_hash: true,
            description: Some("paydest test".to_string()),
            expiry: None,
            payee_field: None,
        })
    }

    /// Amount section of the hrp, e.g. `2500u`.
    pub fn amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn expiry(mut self, seconds: u64) -> Self {
        self.expiry = Some(seconds);
        self
    }

    pub fn without_payment_hash(mut self) -> Self {
        self.include_payment_hash = false;
        self
    }

    /// Writes the signing key into an explicit `n` field.
    pub fn with_payee_field(self) -> Self {
        let payee = self.node_pubkey();
        self.payee_field(payee)
    }

    /// Writes an arbitrary `n` field, which may disagree with the signature.
    pub fn payee_field(mut self, payee: PublicKey) -> Self {
        self.payee_field = Some(payee);
        self
    }

    pub fn node_pubkey(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::signing_only(), &self.secret_key)
    }

    pub fn payment_hash_bytes(&self) -> [u8; 32] {
        self.payment_hash
    }

    pub fn build(&self) -> Result<String, TestInvoiceError> {
        let hrp = format!(
            "ln{}{}",
            self.network.bolt11_currency(),
            self.amount.as_deref().unwrap_or_default()
        );

        let mut data = u64_to_fes(self.timestamp, TIMESTAMP_FES);
        if self.include_payment_hash {
            push_field(&mut data, TAG_PAYMENT_HASH, &bytes_to_fes(&self.payment_hash));
        }
        if let Some(description) = &self.description {
            push_field(&mut data, TAG_DESCRIPTION, &bytes_to_fes(description.as_bytes()));
        }
        push_field(&mut data, TAG_PAYMENT_SECRET, &bytes_to_fes(&[0x11; 32]));
        if let Some(expiry) = self.expiry {
            push_field(&mut data, TAG_EXPIRY, &u64_to_fes(expiry, minimal_width(expiry)));
        }
        if let Some(payee) = self.payee_field {
            push_field(&mut data, TAG_PAYEE, &bytes_to_fes(&payee.serialize()));
        }

        let message = Message::from_digest(signing_digest(&hrp, &data));
        let signature = Secp256k1::signing_only().sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();
        let recovery = u8::try_from(recovery_id.to_i32())
            .map_err(|error| TestInvoiceError(error.to_string()))?;
        let mut signature_bytes = compact.to_vec();
        signature_bytes.push(recovery);
        data.extend(bytes_to_fes(&signature_bytes));

        let hrp = Hrp::parse(&hrp).map_err(|error| TestInvoiceError(error.to_string()))?;
        let fes = data
            .into_iter()
            .map(Fe32::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| TestInvoiceError(error.to_string()))?;
        Ok(fes.into_iter().with_checksum::<Bech32>(&hrp).chars().collect())
    }
}

fn push_field(data: &mut Vec<u8>, tag: u8, value: &[u8]) {
    let len = value.len();
    data.push(tag);
    data.push(((len >> 5) & 0x1f) as u8);
    data.push((len & 0x1f) as u8);
    data.extend_from_slice(value);
}

fn u64_to_fes(value: u64, width: usize) -> Vec<u8> {
    (0..width)
        .rev()
        .map(|index| ((value >> (index * 5)) & 0x1f) as u8)
        .collect()
}

fn minimal_width(value: u64) -> usize {
    let mut width = 1;
    while width < 13 && value >> (width * 5) != 0 {
        width += 1;
    }
    width
}
