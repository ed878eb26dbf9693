use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use estate_console::domain::{extract, FormContext, FormSnapshot};
use estate_console::form::{FieldDescriptor, FieldKind, MaskKind, StepDescriptor, Validator};
use estate_console::table::{build_query, SortDirection, TableState};
use serde_json::json;

fn listing_state() -> TableState {
    let mut state = TableState::new(3, 25);
    state.search = "Apartamento Centro".to_string();
    state.set_sort("owner.name", Some(SortDirection::Asc));
    state.set_sort("rent_amount", Some(SortDirection::Desc));
    state
        .filters
        .insert("status".to_string(), json!("active"));
    state
        .filters
        .insert("type".to_string(), json!(["house", "apartment", "commercial"]));
    state.filters.insert(
        "period".to_string(),
        json!({ "from": "2024-01-01", "to": "2024-12-31" }),
    );
    state.filters.insert("agency_id".to_string(), json!(4));
    state
}

fn owner_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new(
            "Dados pessoais",
            vec![
                FieldDescriptor::new("name", "Nome", FieldKind::Text)
                    .required()
                    .length(Some(3), Some(120)),
                FieldDescriptor::new("email", "E-mail", FieldKind::Email).required(),
                FieldDescriptor::new("phone", "Telefone", FieldKind::Phone).mask(MaskKind::Phone),
                FieldDescriptor::new("document", "CPF", FieldKind::Text)
                    .required()
                    .mask(MaskKind::Cpf),
            ],
        ),
        StepDescriptor::new(
            "Acesso",
            vec![
                FieldDescriptor::new("password", "Senha", FieldKind::Password)
                    .required()
                    .length(Some(8), None),
                FieldDescriptor::new("password_confirmation", "Confirmar senha", FieldKind::Password)
                    .required(),
            ],
        ),
    ]
}

fn owner_snapshot() -> FormSnapshot {
    [
        ("name", json!("Maria Oliveira")),
        ("email", json!("maria@example.com")),
        ("phone", json!("(11) 98765-4321")),
        ("document", json!("529.982.247-25")),
        ("password", json!("segredo123")),
        ("password_confirmation", json!("segredo123")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn benchmark_build_query(c: &mut Criterion) {
    let state = listing_state();

    let mut group = c.benchmark_group("table");
    group.throughput(Throughput::Elements(1));
    group.bench_function("build_query", |b| {
        b.iter(|| build_query(black_box(&state)))
    });
    group.finish();
}

fn benchmark_validate_all(c: &mut Criterion) {
    let steps = owner_steps();
    let snapshot = owner_snapshot();
    let context = FormContext::new();
    let validator = Validator::default();

    c.bench_function("validate_all", |b| {
        b.iter(|| validator.validate_all(black_box(&steps), black_box(&snapshot), &context))
    });
}

fn benchmark_extract(c: &mut Criterion) {
    let row = json!({
        "property": {
            "addresses": [
                { "address": { "city": "Santos", "zip_code": "11010-000" } }
            ]
        }
    });

    c.bench_function("extract_nested", |b| {
        b.iter(|| extract(black_box(&row), black_box("property.addresses.0.address.city")))
    });
}

criterion_group!(
    benches,
    benchmark_build_query,
    benchmark_validate_all,
    benchmark_extract
);
criterion_main!(benches);
