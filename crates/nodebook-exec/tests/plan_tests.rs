//! Dry runs over notebook files

use nodebook_core::{Notebook, NodebookConfig};
use nodebook_exec::{identity_rows, plan_notebook, IdentityRow};
use pretty_assertions::assert_eq;
use serde_json::json;

fn write_notebook(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("analysis.ipynb");
    let document = json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": [
            {"cell_type": "code", "id": "load", "metadata": {}, "source": "df = read()", "outputs": []},
            {"cell_type": "code", "id": "peek", "metadata": {}, "source": "#pragma nodebook off\ndf.head()", "outputs": []},
            {"cell_type": "code", "id": "fit", "metadata": {}, "source": "%%time\nmodel = fit(df)", "outputs": []}
        ]
    });
    std::fs::write(&path, document.to_string()).unwrap();
    path
}

#[tokio::test]
async fn test_plan_from_file_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_notebook(dir.path());

    let plan = plan_notebook(Notebook::load(&path).unwrap(), NodebookConfig::new()).await;

    let codes: Vec<&str> = plan.records.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(
        codes,
        vec![
            "%%execute_cell load \ndf = read()",
            "#pragma nodebook off\ndf.head()",
            "%%time\n%%execute_cell fit load\nmodel = fit(df)",
        ]
    );
    assert_eq!(plan.records[2].parent.as_deref(), Some("load"));

    let json = serde_json::to_value(&plan.records).unwrap();
    assert_eq!(json[1]["participates"], json!(false));

    let saved = dir.path().join("saved.ipynb");
    plan.notebook.save(&saved).unwrap();
    let rows = identity_rows(Notebook::load(&saved).unwrap());
    assert_eq!(
        rows,
        vec![
            IdentityRow { position: 0, node: "load".into(), participates: true },
            IdentityRow { position: 1, node: "peek".into(), participates: false },
            IdentityRow { position: 2, node: "fit".into(), participates: true },
        ]
    );
}
