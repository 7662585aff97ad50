//! Domain identifiers.
//!
//! - `RunId`: ULID ベース。ログファイルは run をまたいで追記されるので、
//!   どの run のイベントかを区別するために使う。生成順でソート可能。
//! - `WorkerId`: pool 内の 1-origin 番号。表示は `worker-N`。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of one `App::run` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(Ulid);

impl RunId {
    const PREFIX: &'static str = "run-";

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for RunId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| format!("run id must start with {:?}: {s}", Self::PREFIX))?;
        Ulid::from_string(raw)
            .map(Self)
            .map_err(|e| format!("invalid run id {s}: {e}"))
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of a worker within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u32);

impl WorkerId {
    const PREFIX: &'static str = "worker-";

    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for WorkerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(Self::PREFIX)
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| format!("invalid worker id: {s}"))
    }
}

impl Serialize for WorkerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_sortable() {
        // ULID は時刻ベースなので、生成順序でソート可能
        let id1 = RunId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = RunId::from_ulid(Ulid::new());

        assert!(id1 < id2);
        assert!(id1.to_string().starts_with("run-"));
    }

    #[test]
    fn ids_serialize_as_display_strings() {
        let run = RunId::from_ulid(Ulid::new());
        let worker = WorkerId::new(3);

        let v = serde_json::json!({ "run": run, "worker": worker });
        assert_eq!(v["worker"], "worker-3");
        assert_eq!(v["run"], run.to_string());

        let back: RunId = serde_json::from_value(v["run"].clone()).unwrap();
        assert_eq!(back, run);
        let back: WorkerId = serde_json::from_value(v["worker"].clone()).unwrap();
        assert_eq!(back, worker);
    }

    #[test]
    fn malformed_worker_id_is_rejected() {
        assert!("Worker-1".parse::<WorkerId>().is_err());
        assert!("worker-x".parse::<WorkerId>().is_err());
        assert_eq!("worker-12".parse::<WorkerId>().unwrap().get(), 12);
    }
}
