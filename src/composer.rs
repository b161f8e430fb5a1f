// Axon sidechain client implementing checker & collator roles
// Written in 2021 by
//     Axon Client developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Turning processed transformations into signed transactions.

use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use crate::ckb::{
    blake160, new_blake2b, Bytes, CellDep, RawTransaction, Transaction,
    WitnessArgs, H160, H256, SIGNATURE_SIZE,
};
use crate::molecule::{self, MoleculeEncode};
use crate::transformation::{ComposedTransaction, Transformation};
use crate::witness::{self, Pattern};
use crate::cell;

lazy_static! {
    /// Global Secp256k1 context
    pub static ref SECP256K1: Secp256k1<secp256k1::All> = Secp256k1::new();
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum SignerError {
    /// invalid secret key: {0}
    InvalidKey(String),
}

/// Credential of the client
pub trait Signer: Send + Sync {
    /// Lock argument of the default secp256k1 lock owned by the signer
    fn lock_arg(&self) -> H160;

    /// Produces recoverable signature: 64 bytes of the compact signature
    /// followed by the recovery id
    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_SIZE], SignerError>;
}

/// Signer with a secp256k1 secret key; signatures are deterministic
/// (RFC 6979)
#[derive(Clone, Debug)]
pub struct Secp256k1Signer {
    secret_key: SecretKey,
    lock_arg: H160,
}

impl Secp256k1Signer {
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1, &secret_key);
        Secp256k1Signer {
            secret_key,
            lock_arg: blake160(public_key.serialize()),
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, SignerError> {
        SecretKey::from_slice(data)
            .map(Secp256k1Signer::new)
            .map_err(|err| SignerError::InvalidKey(err.to_string()))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&SECP256K1, &self.secret_key)
    }
}

impl Signer for Secp256k1Signer {
    fn lock_arg(&self) -> H160 {
        self.lock_arg
    }

    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_SIZE], SignerError> {
        let message = Message::from_digest(*digest);
        let signature =
            SECP256K1.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();
        let mut ret = [0u8; SIGNATURE_SIZE];
        ret[..64].copy_from_slice(&compact);
        ret[64] = recovery_id.to_i32() as u8;
        Ok(ret)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Display, From, Error)]
#[display(doc_comments)]
pub enum Error {
    /// unable to compose transaction: {0}
    #[from]
    Cell(cell::Error),

    /// unable to compose transaction witness: {0}
    #[from]
    Witness(witness::Error),

    /// unable to encode transaction: {0}
    #[from]
    Molecule(molecule::Error),

    /// unable to sign transaction: {0}
    #[from]
    Signer(SignerError),

    /// {0} transformation is not processed by the engine
    NotProcessed(Pattern),

    /// {0} transformation has no inputs
    NoInputs(Pattern),
}

/// CKB sighash-all message: transaction hash followed by every witness as
/// its `u64` length and bytes. The first witness must carry the zero
/// signature placeholder.
pub fn sighash_all(
    tx_hash: &H256,
    witnesses: &[Bytes],
) -> Result<[u8; 32], Error> {
    let mut hasher = new_blake2b();
    molecule_encode_list!(hasher; tx_hash);
    for witness in witnesses {
        molecule_encode_list!(hasher; (witness.len() as u64));
        hasher.update(witness);
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(hasher.finalize().as_bytes());
    Ok(digest)
}

/// Assembles and signs transactions
#[derive(Clone, Debug)]
pub struct Composer<S: Signer> {
    signer: S,
    /// Dependencies required by every transaction, like the secp256k1 lock
    /// dep group
    baseline_deps: Vec<CellDep>,
}

impl<S: Signer> Composer<S> {
    pub fn new(signer: S, baseline_deps: Vec<CellDep>) -> Self {
        Composer {
            signer,
            baseline_deps,
        }
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Builds signed transaction for the transformation and stores it in
    /// the transformation outcome; skipped transformations are left as is
    pub fn compose<T>(&self, transformation: &mut T) -> Result<(), Error>
    where
        T: Transformation + ?Sized,
    {
        let pattern = transformation.pattern();
        if transformation.outcome().skip {
            trace!("Transformation {} is skipped, nothing to compose", pattern);
            return Ok(());
        }
        let input_type = match transformation.witness()? {
            Some(witness) if transformation.outcome().processed => witness,
            _ => return Err(Error::NotProcessed(pattern)),
        };

        let inputs = transformation.inputs()?;
        if inputs.is_empty() {
            return Err(Error::NoInputs(pattern));
        }
        let (outputs, outputs_data): (Vec<_>, Vec<_>) = transformation
            .outputs()?
            .into_iter()
            .map(cell::CellBody::into_output)
            .unzip();
        let mut cell_deps = transformation.cell_deps()?;
        cell_deps.extend(self.baseline_deps.iter().cloned());

        let raw = RawTransaction {
            version: 0,
            cell_deps: cell_deps.into(),
            header_deps: none!(),
            inputs: inputs.into(),
            outputs: outputs.into(),
            outputs_data: outputs_data.into(),
        };
        let hash = raw.hash()?;

        let mut witnesses = vec![Bytes::default(); raw.inputs.len()];
        let mut witness_args = WitnessArgs::placeholder(Some(input_type));
        witnesses[0] = witness_args.molecule_serialize()?.into();
        let digest = sighash_all(&hash, &witnesses)?;
        let signature = self.signer.sign_recoverable(&digest)?;
        witness_args.lock = Some(Bytes::from(signature.to_vec()));
        witnesses[0] = witness_args.molecule_serialize()?.into();

        debug!(
            "Composed {} transaction {} with {} inputs",
            pattern,
            hash,
            raw.inputs.len()
        );
        transformation.outcome_mut().composed = Some(ComposedTransaction {
            tx: Transaction {
                raw,
                witnesses: witnesses.into(),
            },
            hash,
        });
        Ok(())
    }
}
