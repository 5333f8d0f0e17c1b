//! Shared test helpers for integration tests
//!
//! Builds per-tool SQLite databases in a temp directory laid out the way the
//! binary expects: `<tmp>/data/Tool_<id>.db` plus an empty
//! `<tmp>/metroscope.yaml` so the user's own config is never picked up.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get a metroscope command
pub fn metroscope() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("metroscope"));
    cmd.env_remove("METROSCOPE_DATA_DIR").env_remove("RUST_LOG");
    cmd
}

/// Command running inside a test workspace, pointed at its data directory
pub fn metroscope_in(tmp: &TempDir) -> Command {
    let mut cmd = metroscope();
    cmd.current_dir(tmp.path())
        .arg("--data-dir")
        .arg(data_dir(tmp));
    cmd
}

pub fn data_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data")
}

/// One coarse measurement: time, lot, X die, X, Y
pub type CoarseRow<'a> = (&'a str, &'a str, i64, f64, f64);

/// One TAD measurement: lot, TIS_X, DAD_Pos_X, Slope_X, B_X
pub type TadRow<'a> = (&'a str, f64, f64, f64, f64);

fn open_db(dir: &Path, tool: &str) -> Connection {
    std::fs::create_dir_all(dir).unwrap();
    Connection::open(dir.join(format!("Tool_{}.db", tool))).unwrap()
}

fn pass_fail(v: f64, low: f64, high: f64) -> &'static str {
    if (low..=high).contains(&v) {
        "Pass"
    } else {
        "Fail"
    }
}

/// Write a Coarse_Data table for a tool
pub fn create_coarse_table(dir: &Path, tool: &str, rows: &[CoarseRow]) {
    let conn = open_db(dir, tool);
    conn.execute_batch(
        r#"CREATE TABLE Coarse_Data (
            "Time" TEXT, "X Pass/Fail" TEXT, "Y Pass/Fail" TEXT, "Lot Name" TEXT,
            "X_Die" INTEGER, "Y_Die" INTEGER, "Static Iteration" INTEGER,
            "Orientation" TEXT, "Site Serial Number" TEXT, "X" REAL, "Y" REAL
        )"#,
    )
    .unwrap();
    for (time, lot, x_die, x, y) in rows {
        conn.execute(
            "INSERT INTO Coarse_Data VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, '0', 'SN-1', ?6, ?7)",
            params![
                time,
                pass_fail(*x, 478.5, 481.5),
                pass_fail(*y, 403.5, 406.5),
                lot,
                x_die,
                x,
                y
            ],
        )
        .unwrap();
    }
}

/// Write a Tad_Data table for a tool
pub fn create_tad_table(dir: &Path, tool: &str, rows: &[TadRow]) {
    let conn = open_db(dir, tool);
    conn.execute_batch(
        "CREATE TABLE Tad_Data (
            Time TEXT, Recipe TEXT, Lot TEXT, Phase TEXT, Site_Serial_Number TEXT,
            Die_X INTEGER, Die_Y INTEGER, Misreg_X REAL, Misreg_Y REAL,
            TIS_X REAL, TIS_Y REAL, DAD_Pos_X REAL, DAD_Pos_Y REAL,
            Slope_X REAL, Slope_Y REAL, B_X REAL, B_Y REAL,
            Exit_Reason TEXT, Stats TEXT
        )",
    )
    .unwrap();
    for (i, (lot, tis_x, dad_x, slope_x, b_x)) in rows.iter().enumerate() {
        conn.execute(
            "INSERT INTO Tad_Data VALUES (?1, 'RCP-1', ?2, 'Converge', 'SN-1', 1, 2, 0.1, 0.2,
                ?3, 0.5, ?4, 10.0, ?5, 1.0, ?6, 3.0, 'Converged', 'OK')",
            params![format!("2024-02-0{} 09:00:00", i + 1), lot, tis_x, dad_x, slope_x, b_x],
        )
        .unwrap();
    }
}

pub const COARSE_101: &[CoarseRow] = &[
    ("2024-01-01 08:00:00", "Lot A", 1, 480.0, 405.0),
    ("2024-01-02 08:00:00", "Lot A", 2, 482.0, 405.0),
    ("2024-01-03 08:00:00", "Lot B", 1, 479.0, 403.0),
];

pub const TAD_101: &[TadRow] = &[
    ("L1", 0.1, 17.0, 0.002, 16.0),
    ("L1", 0.2, 12.0, 9.5, 14.0),
    ("L2", 0.3, 22.0, -0.5, 12.0),
];

/// Workspace with tool 101 (both schemas) and tool 202 (TAD only)
pub fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = data_dir(&tmp);
    create_coarse_table(&dir, "101", COARSE_101);
    create_tad_table(&dir, "101", TAD_101);
    create_tad_table(&dir, "202", &[("L9", 0.5, 16.0, 1.0, 2.0)]);
    std::fs::write(tmp.path().join("metroscope.yaml"), "").unwrap();
    tmp
}
