//! AES-GCM storable coder.

use std::io::{Read, Write};

use tracing::info;

use super::master::MasterSecret;
use super::CoderId;
use crate::crypto;
use crate::error::Result;
use crate::sensitive::ByteSecret;

/// AES-GCM coder backed by an exportable [`MasterSecret`].
#[derive(Debug)]
pub struct AesCoder {
    master: MasterSecret,
}

impl AesCoder {
    pub(crate) fn generate(id: CoderId) -> Self {
        info!("Generating new {id} coder...");
        Self {
            master: MasterSecret::generate(id),
        }
    }

    pub(crate) fn from_master(master: MasterSecret) -> Self {
        info!("Loading {} coder...", master.id());
        Self { master }
    }

    pub fn id(&self) -> CoderId {
        self.master.id()
    }

    pub fn store(&self) -> ByteSecret {
        self.master.encode()
    }

    pub fn encrypt_stream<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        crypto::seal_stream(self.master.key(), input, output)
    }

    pub fn decrypt_stream<R: Read + ?Sized, W: Write + ?Sized>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<u64> {
        crypto::open_stream(self.master.key(), input, output)
    }
}
