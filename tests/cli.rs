use std::path::{Path, PathBuf};

use assert_cmd::Command;
use calamine::Reader;
use predicates::prelude::*;

const CSV: &str = "Data Emissao,R$ Total,FRANQUIA,Categoria,Descrição Item,Pedido\n\
                   14/03/2025,100,A,X,Copo 300ml,1\n\
                   14/03/2025,50,B,CAIXA DE PIZZA,Caixa 35cm,2\n\
                   15/03/2025,30,B,Y,Tampa,3\n";

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("franchise-dashboard").unwrap();
    cmd.env("HOME", home)
        .env("FRANCHISE_DASHBOARD_CONFIG", home.join("settings.json"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn options_lists_franchises_and_items() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    cmd(dir.path())
        .arg("options")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("File 'itens.csv' loaded: 3 rows (0 dropped)."))
        .stdout(predicate::str::contains("Caixa 35cm"))
        .stdout(predicate::str::contains("Tampa"));
}

#[test]
fn summary_excludes_pizza_boxes() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap(), "-f", "A", "-f", "B"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 130.00"))
        .stdout(predicate::str::contains("CAIXA DE PIZZA").not());
}

#[test]
fn summary_without_franchise_prompts_for_selection() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("select one or more franchises"))
        .stdout(predicate::str::contains("Revenue total").not());
}

#[test]
fn summary_with_no_matching_rows_warns() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap(), "-f", "Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No data found for the selected filters"));
}

#[test]
fn missing_columns_fail_with_names() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "itens.csv",
        "Data Emissao,FRANQUIA,Descrição Item\n14/03/2025,A,Copo\n",
    );
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap(), "-f", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error: Columns not found: R$ Total, Categoria",
        ));
}

#[test]
fn export_writes_two_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    let out = dir.path().join("reports");
    cmd(dir.path())
        .args(["export", file.to_str().unwrap(), "-f", "A", "-f", "B", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Relatorio_Analitico_Franquias.xlsx"));

    let report = out.join("Relatorio_Analitico_Franquias.xlsx");
    let mut wb = calamine::open_workbook_auto(&report).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Base_Completa", "Dados_Filtrados"]);
    // header + rows
    assert_eq!(wb.worksheet_range("Base_Completa").unwrap().height(), 4);
    assert_eq!(wb.worksheet_range("Dados_Filtrados").unwrap().height(), 3);
}

#[test]
fn export_without_franchise_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    cmd(dir.path())
        .args(["export", file.to_str().unwrap(), "-o"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No franchise selected"));
    assert!(!dir.path().join("Relatorio_Analitico_Franquias.xlsx").exists());
}

#[test]
fn configured_exclusions_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path(), "itens.csv", CSV);
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"excluded_categories": ["tampa", "y"]}"#,
    )
    .unwrap();
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap(), "-f", "B"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 50.00"));
}

#[test]
fn init_writes_default_settings() {
    let dir = tempfile::tempdir().unwrap();
    cmd(dir.path()).arg("init").assert().success();
    let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
    assert!(content.contains("CAIXA DE PIZZA"));

    cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exist"));
}

#[test]
fn numeric_looking_franchise_codes_filter_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(
        dir.path(),
        "itens.csv",
        "Data Emissao,R$ Total,FRANQUIA,Categoria,Descrição Item\n\
         14/03/2025,40,007,Copos,Copo\n\
         14/03/2025,60,7,Copos,Copo\n",
    );
    cmd(dir.path())
        .args(["summary", file.to_str().unwrap(), "-f", "007"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 40.00"))
        .stdout(predicate::str::contains("R$ 100.00").not());
}
