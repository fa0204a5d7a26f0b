//! Same dataset, same selection, same output. Always.
//!
//! Filter + aggregate are recomputed on every interaction, so two passes
//! over the canonical dataset must serialize to identical bytes.

use leads_core::{
    config::PipelineConfig,
    dataset::Dataset,
    filter::FilterSelection,
    loader::read_csv,
    session::evaluate,
};

const SOURCE: &str = "Toma de contacto,Fecha de Creación,Fecha de Conversión,Producto\n\
    Web,01/01/2019 10:00,05/01/2019,A\n\
    Web,15/01/2019 09:00,,\n\
    Email,03/02/2019 11:00,13/02/2019,B\n\
    Email,04/02/2019 11:00,,\n\
    Feria,10/06/2020 08:00,,A\n\
    Teléfono,11/06/2020 08:00,,\n\
    Teléfono,12/06/2020 08:00,20/06/2020,C\n\
    Web,13/06/2020 08:00,,\n\
    ,13/06/2020 08:00,,\n\
    Web,13/06/2022 08:00,,\n";

fn build() -> Dataset {
    let config = PipelineConfig::default();
    let raw = read_csv(SOURCE.as_bytes(), &config).expect("read source");
    Dataset::build(&raw, &config)
}

#[test]
fn repeated_evaluation_is_byte_identical() {
    let config = PipelineConfig::default();
    let ds = build();
    let selection = FilterSelection::all(&ds)
        .expect("non-empty dataset")
        .with_channels(["Web", "Teléfono"]);

    let a = evaluate(&ds, Some(selection.clone()), &config);
    let b = evaluate(&ds, Some(selection), &config);

    let json_a = serde_json::to_string(&a).expect("serialize a");
    let json_b = serde_json::to_string(&b).expect("serialize b");
    assert_eq!(json_a, json_b, "Aggregation output diverged between passes");
}

#[test]
fn independently_built_datasets_agree() {
    let config = PipelineConfig::default();
    let a = build();
    let b = build();
    assert_eq!(a, b);

    let state_a = evaluate(&a, FilterSelection::all(&a), &config);
    let state_b = evaluate(&b, FilterSelection::all(&b), &config);
    assert_eq!(state_a, state_b);
    assert_eq!(state_a.filtered_records, 8);
}
