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

//! JSON-RPC collaborators: CKB indexer scanner, CKB node submitter and the
//! sidechain node reporting chain info and checking task block ranges.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use axon::cell::{LiveCell, Task};
use axon::ckb::{
    Bytes, CellDep, CellInput, CellOutput, DepType, OutPoint, Script,
    Transaction, H256,
};
use axon::engine::ChainInfo;
use axon::role::{
    CellQuery, CollaboratorError, CrossChain, ScanError, Scanner, ScriptFilter,
    Submitter, TaskVerifier,
};

/// Page size of the indexer `get_cells` requests
const PAGE_SIZE: u64 = 100;

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum RpcError {
    /// transport failure: {0}
    Transport(String),

    /// server error {0}: {1}
    Server(i64, String),

    /// invalid response: {0}
    InvalidResponse(String),
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        RpcError::Transport(err.to_string())
    }
}

impl From<RpcError> for CollaboratorError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Transport(msg) => CollaboratorError::Unavailable(msg),
            other => CollaboratorError::InvalidResponse(other.to_string()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct Response<R> {
    result: Option<R>,
    error: Option<ErrorObject>,
}

impl<R> Response<R> {
    fn into_result(self) -> Result<R, RpcError> {
        match (self.result, self.error) {
            (_, Some(err)) => Err(RpcError::Server(err.code, err.message)),
            (Some(result), None) => Ok(result),
            (None, None) => {
                Err(RpcError::InvalidResponse(s!("response has no result")))
            }
        }
    }
}

/// JSON-RPC 2.0 client over HTTP
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl ToString) -> Self {
        JsonRpcClient {
            url: url.to_string(),
            client: reqwest::Client::new(),
            id: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn call<R>(&self, method: &str, params: Value) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        let id = self.id.fetch_add(1, Ordering::SeqCst);
        trace!("RPC {} #{} request to {}", method, id, self.url);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response: Response<R> = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|err| RpcError::InvalidResponse(err.to_string()))?;
        response.into_result()
    }
}

/// Quantity encoded as `0x`-prefixed hex string, as in CKB JSON
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Default,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
pub struct Quantity(pub u64);

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s.trim_start_matches("0x"), 16).map(Quantity)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate")]
struct JsonOutPoint {
    tx_hash: H256,
    index: Quantity,
}

impl From<&OutPoint> for JsonOutPoint {
    fn from(out_point: &OutPoint) -> Self {
        JsonOutPoint {
            tx_hash: out_point.tx_hash,
            index: Quantity(out_point.index as u64),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct JsonCellOutput {
    capacity: Quantity,
    lock: Script,
    #[serde(rename = "type", default)]
    type_: Option<Script>,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct JsonCell {
    output: JsonCellOutput,
    #[serde(default)]
    output_data: Bytes,
    out_point: JsonOutPoint,
}

impl JsonCell {
    fn into_live_cell(self) -> Result<LiveCell, RpcError> {
        let index = u32::try_from(self.out_point.index.0).map_err(|_| {
            RpcError::InvalidResponse(format!(
                "out point index {} is out of range",
                self.out_point.index
            ))
        })?;
        Ok(LiveCell {
            capacity: self.output.capacity.0,
            lock: self.output.lock,
            type_: self.output.type_,
            data: self.output_data,
            out_point: Some(OutPoint::new(self.out_point.tx_hash, index)),
        })
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct CellsPage {
    objects: Vec<JsonCell>,
    last_cursor: Value,
}

fn script_json(script: &Script) -> Value {
    json!({
        "code_hash": script.code_hash,
        "hash_type": script.hash_type,
        "args": script.args,
    })
}

fn filter_json(filter: &ScriptFilter) -> Value {
    json!({
        "code_hash": filter.code_hash,
        "hash_type": filter.hash_type,
        "args": filter.args_prefix,
    })
}

/// Indexer search key: the most specific script is searched by, the other
/// one filters the results
fn search_key(query: &CellQuery) -> Result<Value, ScanError> {
    let (script, script_type, filter) = match (&query.type_, &query.lock) {
        (Some(type_), lock) => (type_, "type", lock.as_ref().map(filter_json)),
        (None, Some(lock)) => (lock, "lock", None),
        (None, None) => {
            return Err(ScanError::Indexer(format!(
                "query for {} cells has no scripts",
                query.kind
            )))
        }
    };
    let mut key = json!({
        "script": filter_json(script),
        "script_type": script_type,
        "script_search_mode": "prefix",
    });
    if let Some(filter) = filter {
        key["filter"] = json!({ "script": filter });
    }
    Ok(key)
}

fn out_point_json(out_point: &OutPoint) -> Value {
    json!(JsonOutPoint::from(out_point))
}

fn dep_json(dep: &CellDep) -> Value {
    let dep_type = match dep.dep_type {
        DepType::Code => "code",
        DepType::DepGroup => "dep_group",
    };
    json!({
        "out_point": out_point_json(&dep.out_point),
        "dep_type": dep_type,
    })
}

fn input_json(input: &CellInput) -> Value {
    json!({
        "since": Quantity(input.since),
        "previous_output": out_point_json(&input.previous_output),
    })
}

fn output_json(output: &CellOutput) -> Value {
    json!({
        "capacity": Quantity(output.capacity),
        "lock": script_json(&output.lock),
        "type": output.type_.as_ref().map(script_json),
    })
}

/// Transaction in CKB JSON representation
pub fn transaction_json(tx: &Transaction) -> Value {
    let raw = &tx.raw;
    json!({
        "version": Quantity(raw.version as u64),
        "cell_deps": raw.cell_deps.iter().map(dep_json).collect::<Vec<_>>(),
        "header_deps": raw.header_deps.iter().collect::<Vec<_>>(),
        "inputs": raw.inputs.iter().map(input_json).collect::<Vec<_>>(),
        "outputs": raw.outputs.iter().map(output_json).collect::<Vec<_>>(),
        "outputs_data": raw.outputs_data.iter().collect::<Vec<_>>(),
        "witnesses": tx.witnesses.iter().collect::<Vec<_>>(),
    })
}

/// Scanner backed by CKB indexer `get_cells` method
#[derive(Debug)]
pub struct CkbIndexer {
    client: JsonRpcClient,
}

impl CkbIndexer {
    pub fn new(url: impl ToString) -> Self {
        CkbIndexer {
            client: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl Scanner for CkbIndexer {
    async fn scan(
        &self,
        query: &CellQuery,
        as_of_block: Option<u64>,
    ) -> Result<Vec<LiveCell>, ScanError> {
        if as_of_block.is_some() {
            warn!("Indexer scans only the tip state, block number is ignored");
        }
        let key = search_key(query)?;
        let mut cursor = Value::Null;
        let mut cells = vec![];
        loop {
            let page: CellsPage = self
                .client
                .call(
                    "get_cells",
                    json!([key, "asc", Quantity(PAGE_SIZE), cursor]),
                )
                .await
                .map_err(|err| ScanError::Indexer(err.to_string()))?;
            let count = page.objects.len();
            for cell in page.objects {
                let cell = cell
                    .into_live_cell()
                    .map_err(|err| ScanError::Indexer(err.to_string()))?;
                if query.matches(&cell) {
                    cells.push(cell);
                }
            }
            if (count as u64) < PAGE_SIZE {
                break;
            }
            cursor = page.last_cursor;
        }
        trace!("Indexer returned {} {} cells", cells.len(), query.kind);
        Ok(cells)
    }
}

/// Submitter backed by CKB node `send_transaction` method
#[derive(Debug)]
pub struct CkbNode {
    client: JsonRpcClient,
}

impl CkbNode {
    pub fn new(url: impl ToString) -> Self {
        CkbNode {
            client: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl Submitter for CkbNode {
    async fn send(&self, tx: &Transaction) -> bool {
        let params = json!([transaction_json(tx), "passthrough"]);
        match self.client.call::<H256>("send_transaction", params).await {
            Ok(hash) => {
                debug!("CKB node accepted transaction {}", hash);
                true
            }
            Err(err) => {
                error!("Transaction is not sent: {}", err);
                false
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(crate = "serde_crate")]
struct JsonChainInfo {
    latest_height: Quantity,
    latest_hash: H256,
    check_data_size: Quantity,
}

/// Sidechain node reporting its progress and checking block ranges
#[derive(Debug)]
pub struct SidechainNode {
    client: JsonRpcClient,
}

impl SidechainNode {
    pub fn new(url: impl ToString) -> Self {
        SidechainNode {
            client: JsonRpcClient::new(url),
        }
    }
}

#[async_trait]
impl CrossChain for SidechainNode {
    async fn chain_info(&self) -> Result<ChainInfo, CollaboratorError> {
        let info: JsonChainInfo =
            self.client.call("axon_getChainInfo", json!([])).await?;
        Ok(ChainInfo {
            latest_height: info.latest_height.0 as u128,
            latest_hash: info.latest_hash,
            check_data_size: info.check_data_size.0 as u128,
        })
    }
}

#[async_trait]
impl TaskVerifier for SidechainNode {
    async fn verify(&self, task: &Task) -> Result<bool, CollaboratorError> {
        let from = u64::try_from(task.data.check_block_height_from);
        let to = u64::try_from(task.data.check_block_height_to);
        let (from, to) = match (from, to) {
            (Ok(from), Ok(to)) => (from, to),
            _ => return Ok(false),
        };
        let params = json!([
            Quantity(from),
            Quantity(to),
            task.data.check_block_hash_to,
        ]);
        Ok(self.client.call("axon_verifyBlockRange", params).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axon::cell::{CellKind, CellTemplates};
    use axon::ckb::{HashType, RawTransaction, ScriptTemplate};
    use axon::role::QueryBuilder;

    fn templates() -> CellTemplates {
        let mut templates = CellTemplates::default();
        templates.task.type_ =
            ScriptTemplate::new(H256([0x33; 32]), HashType::Type).with_args(vec![]);
        templates.sidechain_bond.lock =
            ScriptTemplate::new(H256([0x44; 32]), HashType::Data1).with_args(vec![]);
        templates.sidechain_bond.type_ =
            ScriptTemplate::new(H256([0x55; 32]), HashType::Type).with_args(vec![]);
        templates
    }

    #[test]
    fn test_quantity() {
        assert_eq!(Quantity(255).to_string(), "0xff");
        assert_eq!(Quantity::from_str("0x10").unwrap(), Quantity(16));
        assert_eq!(Quantity::from_str("10").unwrap(), Quantity(16));
        assert!(Quantity::from_str("0xzz").is_err());
        assert_eq!(json!(Quantity(0)), json!("0x0"));
    }

    #[test]
    fn test_search_key() {
        let templates = templates();
        let queries = QueryBuilder::new(&templates, 2);
        let key = search_key(&queries.tasks(None)).unwrap();
        assert_eq!(key["script_type"], "type");
        assert_eq!(key["script"]["args"], "0x02");
        assert_eq!(key["script"]["hash_type"], "type");
        assert!(key.get("filter").is_none());

        let key = search_key(&queries.sidechain_bond([0xAA; 20])).unwrap();
        assert_eq!(key["script_type"], "type");
        assert_eq!(key["filter"]["script"]["hash_type"], "data1");
        assert_eq!(
            key["filter"]["script"]["args"],
            format!("0x02{}", "aa".repeat(20))
        );

        let query = CellQuery {
            kind: CellKind::Code,
            lock: None,
            type_: None,
        };
        assert!(matches!(search_key(&query), Err(ScanError::Indexer(_))));
    }

    #[test]
    fn test_cell_parsing() {
        let page: CellsPage = serde_json::from_value(json!({
            "objects": [{
                "output": {
                    "capacity": "0x2540be400",
                    "lock": {
                        "code_hash": format!("0x{}", "11".repeat(32)),
                        "hash_type": "data1",
                        "args": "0x01"
                    },
                    "type": null
                },
                "output_data": "0xabcd",
                "out_point": {
                    "tx_hash": format!("0x{}", "22".repeat(32)),
                    "index": "0x1"
                },
                "block_number": "0x10",
                "tx_index": "0x0"
            }],
            "last_cursor": "0x00"
        }))
        .unwrap();
        let cell = page.objects[0].clone().into_live_cell().unwrap();
        assert_eq!(cell.capacity, 10_000_000_000);
        assert_eq!(cell.lock.hash_type, HashType::Data1);
        assert_eq!(cell.type_, None);
        assert_eq!(cell.data.as_slice(), &[0xAB, 0xCD]);
        assert_eq!(cell.out_point, Some(OutPoint::new(H256([0x22; 32]), 1)));
    }

    #[test]
    fn test_transaction_json() {
        let lock = ScriptTemplate::new(H256([0x11; 32]), HashType::Type)
            .with_args(vec![0x01]);
        let tx = Transaction {
            raw: RawTransaction {
                version: 0,
                cell_deps: vec![CellDep {
                    out_point: OutPoint::new(H256([0x22; 32]), 0),
                    dep_type: DepType::DepGroup,
                }]
                .into(),
                header_deps: Default::default(),
                inputs: vec![CellInput::new(OutPoint::new(H256([0x33; 32]), 2))]
                    .into(),
                outputs: vec![CellOutput {
                    capacity: 100,
                    lock,
                    type_: None,
                }]
                .into(),
                outputs_data: vec![Bytes::default()].into(),
            },
            witnesses: vec![Bytes::from(vec![0x55])].into(),
        };
        let json = transaction_json(&tx);
        assert_eq!(json["version"], "0x0");
        assert_eq!(json["cell_deps"][0]["dep_type"], "dep_group");
        assert_eq!(json["cell_deps"][0]["out_point"]["index"], "0x0");
        assert_eq!(json["inputs"][0]["since"], "0x0");
        assert_eq!(json["inputs"][0]["previous_output"]["index"], "0x2");
        assert_eq!(json["outputs"][0]["capacity"], "0x64");
        assert_eq!(json["outputs"][0]["lock"]["args"], "0x01");
        assert_eq!(json["outputs"][0]["type"], Value::Null);
        assert_eq!(json["outputs_data"][0], "0x");
        assert_eq!(json["witnesses"][0], "0x55");
    }

    #[test]
    fn test_response() {
        let ok: Response<u8> =
            serde_json::from_value(json!({"id": 1, "result": 5})).unwrap();
        assert_eq!(ok.into_result(), Ok(5));
        let err: Response<u8> = serde_json::from_value(json!({
            "id": 1, "error": {"code": -3, "message": "rejected"}
        }))
        .unwrap();
        assert_eq!(err.into_result(), Err(RpcError::Server(-3, s!("rejected"))));
        let empty: Response<u8> = serde_json::from_value(json!({"id": 1})).unwrap();
        assert!(matches!(empty.into_result(), Err(RpcError::InvalidResponse(_))));
        assert_eq!(
            CollaboratorError::from(RpcError::Transport(s!("refused"))),
            CollaboratorError::Unavailable(s!("refused"))
        );
    }
}
