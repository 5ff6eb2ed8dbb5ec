//! Identity persistence through nbformat documents

use nodebook_core::{NodeName, Notebook, NodebookConfig};
use nodebook_exec::prelude::*;
use nodebook_test_utils::{Harness, RecordingView};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn sample_document() -> serde_json::Value {
    json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"kernelspec": {"name": "python3"}},
        "cells": [
            {
                "cell_type": "code",
                "id": "first",
                "metadata": {"tags": ["setup"]},
                "source": ["import math\n", "r = 2"],
                "outputs": [],
                "execution_count": null
            },
            {
                "cell_type": "markdown",
                "id": "notes",
                "metadata": {},
                "source": "Area below"
            },
            {
                "cell_type": "code",
                "id": "second",
                "metadata": {},
                "source": "area = math.pi * r ** 2",
                "outputs": [],
                "execution_count": null
            }
        ]
    })
}

fn reload(session: &Session) -> Notebook {
    let value = session.notebook().to_ipynb_value().unwrap();
    Notebook::from_ipynb_str(&value.to_string()).unwrap()
}

#[test]
fn test_identities_survive_save_and_reload() {
    let notebook = Notebook::from_ipynb_str(&sample_document().to_string()).unwrap();
    let mut session = Session::new(notebook, RecordingView::new(), NodebookConfig::new());
    let kernel = Arc::new(RecordingKernel::new());
    session.attach_kernel(kernel.clone());

    let first = CellKey::new("first");
    let second = CellKey::new("second");
    session.execute_default(&first);
    session.execute_default(&second);
    let before: Vec<NodeName> = [&first, &second]
        .iter()
        .map(|key| session.identity(key).unwrap().clone())
        .collect();

    let reopened = Session::new(reload(&session), RecordingView::new(), NodebookConfig::new());
    let after: Vec<NodeName> = [&first, &second]
        .iter()
        .map(|key| reopened.identity(key).unwrap().clone())
        .collect();

    assert_eq!(before, after);
    assert!(reopened.identities().participates(&first));
    assert!(reopened.identities().participates(&second));
}

#[test]
fn test_foreign_metadata_and_outputs_preserved() {
    let notebook = Notebook::from_ipynb_str(&sample_document().to_string()).unwrap();
    let mut h = Harness::from_notebook(notebook, vec![CellKey::new("first")]);
    h.session.execute_default(&CellKey::new("first"));

    let value = h.session.notebook().to_ipynb_value().unwrap();
    let cell = &value["cells"][0];
    assert_eq!(cell["metadata"]["tags"], json!(["setup"]));
    assert_eq!(cell["metadata"]["node_name"], json!("first"));
    assert_eq!(cell["metadata"]["node_exists"], json!(true));
    assert_eq!(cell["outputs"], json!([]));
    assert_eq!(cell["source"], json!("import math\nr = 2"));
    assert_eq!(value["metadata"]["kernelspec"]["name"], json!("python3"));
    assert!(value["cells"][1]["metadata"].get("node_name").is_none());
}

#[test]
fn test_reloaded_parent_is_used_for_new_runs() {
    let notebook = Notebook::from_ipynb_str(&sample_document().to_string()).unwrap();
    let mut h = Harness::from_notebook(notebook, vec![CellKey::new("first")]);
    h.session.execute_default(&CellKey::new("first"));

    let second = CellKey::new("second");
    let mut h = Harness::from_notebook(reload(&h.session), vec![second.clone()]);
    h.session.execute_default(&second);

    assert_eq!(
        h.last_code(),
        "%%execute_cell second first\narea = math.pi * r ** 2"
    );
}

#[test]
fn test_config_file_drives_dispatch_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodebook.toml");
    std::fs::write(&path, "stop_on_error = false\nsilent = true\n").unwrap();
    let config = NodebookConfig::load(&path).unwrap();

    let mut notebook = Notebook::new();
    let key = notebook.push(Cell::code("x = 1"));
    let mut session = Session::new(notebook, RecordingView::new(), config);
    let kernel = Arc::new(RecordingKernel::new());
    session.attach_kernel(kernel.clone());
    session.execute_default(&key);

    let options = kernel.last_request().unwrap().options;
    assert!(!options.stop_on_error);
    assert!(options.silent);
    assert!(options.store_history);
}
