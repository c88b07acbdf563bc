//! Integration tests for uniqueness validation against the sled store.

use std::sync::{Arc, Barrier};
use std::thread;

use simple_unique::{
    AttributeDef, Condition, Document, DuplicateScanner, Error, ModelDef, ModelValidations,
    Record, StorageConfig, StorageEngine, UniquenessOptions, ValidationConfig, Value,
    DEFAULT_MESSAGE,
};

struct TestContext {
    engine: StorageEngine,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let engine = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        Self { engine, _dir: dir }
    }
}

fn widget_model() -> Arc<ModelDef> {
    Arc::new(
        ModelDef::new("Widget")
            .with_attribute(AttributeDef::string("name"))
            .with_attribute(AttributeDef::string("category"))
            .with_attribute(AttributeDef::string("color"))
            .with_attribute(AttributeDef::bool("should_validate"))
            .with_attribute(AttributeDef::bool("should_not_validate"))
            .with_attribute(AttributeDef::float("weight")),
    )
}

fn widget(model: &Arc<ModelDef>, attrs: &[(&str, Value)]) -> Document {
    let mut doc = Document::new(Arc::clone(model));
    for (name, value) in attrs {
        doc.set(name, value.clone()).unwrap();
    }
    doc
}

fn unique_name(model: &Arc<ModelDef>, options: UniquenessOptions) -> ModelValidations {
    ModelValidations::builder(Arc::clone(model))
        .validates_uniqueness_of("name", options)
        .unwrap()
        .build()
}

#[test]
fn test_only_one_record_with_a_given_value() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut first = widget(&model, &[("name", "Turd Furguson".into())]);
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(&model, &[("name", "Turd Furguson".into())]);
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
    assert_eq!(second.errors().get("name"), [DEFAULT_MESSAGE]);
    assert_eq!(second.errors().get("name"), ["has already been taken"]);
}

#[test]
fn test_only_one_record_with_a_given_value_within_scope() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new().scope("category"));

    let mut first = widget(
        &model,
        &[
            ("name", "Turd Furguson".into()),
            ("category", "Funny name".into()),
        ],
    );
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(
        &model,
        &[
            ("name", "Turd Furguson".into()),
            ("category", "Funny name".into()),
        ],
    );
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
    assert_eq!(second.errors().get("name"), ["has already been taken"]);

    second.set("category", "Silly name").unwrap();
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());
    assert!(second.errors().is_empty());
}

#[test]
fn test_multi_attribute_scope_requires_every_value() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(
        &model,
        UniquenessOptions::new().scope(["category", "color"]),
    );

    let mut stored = widget(
        &model,
        &[
            ("name", "X".into()),
            ("category", "Funny".into()),
            ("color", "red".into()),
        ],
    );
    validations.save(&mut stored, &ctx.engine).unwrap().unwrap();

    let mut same = widget(
        &model,
        &[
            ("name", "X".into()),
            ("category", "Funny".into()),
            ("color", "red".into()),
        ],
    );
    assert!(!validations.validate(&mut same, &ctx.engine).unwrap());

    let mut other_color = same.clone();
    other_color.set("color", "blue").unwrap();
    assert!(validations.validate(&mut other_color, &ctx.engine).unwrap());

    let mut other_cat = same.clone();
    other_cat.set("category", "Silly").unwrap();
    assert!(validations.validate(&mut other_cat, &ctx.engine).unwrap());
}

#[test]
fn test_scope_order_does_not_matter() {
    let ctx = TestContext::new();
    let model = widget_model();
    let forward = unique_name(
        &model,
        UniquenessOptions::new().scope(["category", "color"]),
    );
    let reverse = unique_name(
        &model,
        UniquenessOptions::new().scope(["color", "category"]),
    );

    let mut stored = widget(
        &model,
        &[
            ("name", "X".into()),
            ("category", "Funny".into()),
            ("color", "red".into()),
        ],
    );
    ctx.engine.save(&mut stored).unwrap();

    let candidates = [
        ("Funny", "red"),
        ("Funny", "blue"),
        ("Silly", "red"),
        ("Silly", "blue"),
    ];
    for (category, color) in candidates {
        let mut a = widget(
            &model,
            &[
                ("name", "X".into()),
                ("category", category.into()),
                ("color", color.into()),
            ],
        );
        let mut b = a.clone();
        assert_eq!(
            forward.validate(&mut a, &ctx.engine).unwrap(),
            reverse.validate(&mut b, &ctx.engine).unwrap(),
            "category={} color={}",
            category,
            color
        );
    }
}

#[test]
fn test_message_override() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(
        &model,
        UniquenessOptions::new().message("is already a widget"),
    );

    let mut first = widget(&model, &[("name", "X".into())]);
    validations.save(&mut first, &ctx.engine).unwrap().unwrap();

    let mut dup = widget(&model, &[("name", "X".into())]);
    assert!(validations.save(&mut dup, &ctx.engine).unwrap().is_none());
    assert_eq!(dup.errors().get("name"), ["is already a widget"]);
    assert_eq!(ctx.engine.count("Widget").unwrap(), 1);
}

#[test]
fn test_passing_check_is_repeatable() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut stored = widget(&model, &[("name", "X".into())]);
    ctx.engine.save(&mut stored).unwrap();

    let mut candidate = widget(&model, &[("name", "Y".into())]);
    assert!(validations.validate(&mut candidate, &ctx.engine).unwrap());
    assert!(validations.validate(&mut candidate, &ctx.engine).unwrap());
    assert!(candidate.errors().is_empty());
    assert_eq!(candidate.attribute("name").unwrap(), Value::from("Y"));
}

#[test]
fn test_update_disregards_the_record_itself() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut first = widget(&model, &[("name", "X".into())]);
    let first_id = validations.save(&mut first, &ctx.engine).unwrap().unwrap();

    // Re-saving without touching the unique attribute.
    first.set("category", "Funny").unwrap();
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    assert_eq!(
        validations.save(&mut first, &ctx.engine).unwrap(),
        Some(first_id)
    );

    // A different stored record still conflicts on update.
    let mut second = widget(&model, &[("name", "Y".into())]);
    validations.save(&mut second, &ctx.engine).unwrap().unwrap();
    second.set("name", "X").unwrap();
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_nil_values_skip_by_default() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut first = widget(
        &model,
        &[("name", Value::Null), ("category", "A cat".into())],
    );
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(
        &model,
        &[("name", Value::Null), ("category", "A cat".into())],
    );
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_blank_values_skip_by_default() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut first = widget(&model, &[("name", "".into()), ("category", "A cat".into())]);
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(&model, &[("name", "".into()), ("category", "A cat".into())]);
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_nil_and_blank_checked_when_disallowed() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(
        &model,
        UniquenessOptions::new().allow_nil(false).allow_blank(false),
    );

    let mut nil = widget(&model, &[("category", "A cat".into())]);
    validations.save(&mut nil, &ctx.engine).unwrap().unwrap();
    let mut blank = widget(&model, &[("name", "".into())]);
    validations.save(&mut blank, &ctx.engine).unwrap().unwrap();

    let mut nil_again = widget(&model, &[("category", "A cat".into())]);
    assert!(!validations.validate(&mut nil_again, &ctx.engine).unwrap());

    let mut blank_again = widget(&model, &[("name", "".into())]);
    assert!(!validations.validate(&mut blank_again, &ctx.engine).unwrap());
}

#[test]
fn test_if_option_false_skips_validation() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(
        &model,
        UniquenessOptions::new().only_if(Condition::attribute("should_validate")),
    );

    let mut first = widget(&model, &[("name", "Turd Furguson".into())]);
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(
        &model,
        &[
            ("name", "Turd Furguson".into()),
            ("should_validate", false.into()),
        ],
    );
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());

    second.set("should_validate", true).unwrap();
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_unless_option_true_skips_validation() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(
        &model,
        UniquenessOptions::new().unless(Condition::attribute("should_not_validate")),
    );

    let mut first = widget(&model, &[("name", "Turd Furguson".into())]);
    assert!(validations.validate(&mut first, &ctx.engine).unwrap());
    ctx.engine.save(&mut first).unwrap();

    let mut second = widget(
        &model,
        &[
            ("name", "Turd Furguson".into()),
            ("should_not_validate", true.into()),
        ],
    );
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());

    second.set("should_not_validate", false).unwrap();
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_matching_is_case_sensitive() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut first = widget(&model, &[("name", "Foo".into())]);
    validations.save(&mut first, &ctx.engine).unwrap().unwrap();

    let mut second = widget(&model, &[("name", "foo".into())]);
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());
}

#[test]
fn test_unknown_scope_attribute_is_a_configuration_fault() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new().scope("flavour"));

    let mut record = widget(&model, &[("name", "X".into())]);
    let err = validations.validate(&mut record, &ctx.engine).unwrap_err();
    assert!(matches!(err, Error::UnknownAttribute { ref attribute, .. } if attribute == "flavour"));
    assert!(err.is_configuration_fault());
}

#[test]
fn test_other_models_do_not_conflict() {
    let ctx = TestContext::new();
    let widgets = widget_model();
    let gadgets = Arc::new(
        ModelDef::new("Gadget")
            .with_attribute(AttributeDef::string("name")),
    );

    let mut gadget = Document::new(Arc::clone(&gadgets))
        .with("name", "X")
        .unwrap();
    ctx.engine.save(&mut gadget).unwrap();

    let validations = unique_name(&widgets, UniquenessOptions::new());
    let mut record = widget(&widgets, &[("name", "X".into())]);
    assert!(validations.validate(&mut record, &ctx.engine).unwrap());
}

#[test]
fn test_non_finite_float_never_reaches_the_store() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = unique_name(&model, UniquenessOptions::new());

    let mut odd = widget(&model, &[("name", "a".into())]);
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = odd.set("weight", bad).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
    let odd_id = validations.save(&mut odd, &ctx.engine).unwrap().unwrap();

    // Other records of the model still validate against the store.
    let mut other = widget(&model, &[("name", "b".into()), ("weight", 2.5.into())]);
    assert!(validations.validate(&mut other, &ctx.engine).unwrap());
    validations.save(&mut other, &ctx.engine).unwrap().unwrap();

    let found = ctx.engine.find(&model, odd_id).unwrap().unwrap();
    assert_eq!(found.attribute("weight").unwrap(), Value::Null);
    assert_eq!(ctx.engine.count("Widget").unwrap(), 2);
}

#[test]
fn test_check_then_insert_race_admits_duplicates() {
    let ctx = TestContext::new();
    let model = widget_model();
    let validations = Arc::new(unique_name(&model, UniquenessOptions::new()));
    let engine = Arc::new(ctx.engine);

    // Both writers validate before either saves.
    let checked = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let model = Arc::clone(&model);
            let validations = Arc::clone(&validations);
            let engine = Arc::clone(&engine);
            let checked = Arc::clone(&checked);
            thread::spawn(move || {
                let mut doc = Document::new(model).with("name", "My Post").unwrap();
                let valid = validations.validate(&mut doc, &*engine).unwrap();
                checked.wait();
                engine.save(&mut doc).unwrap();
                valid
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(engine.count("Widget").unwrap(), 2);

    // Any later writer sees the conflict.
    let mut third = Document::new(Arc::clone(&model))
        .with("name", "My Post")
        .unwrap();
    assert!(!validations.validate(&mut third, &*engine).unwrap());

    // The out-of-band scan reports the pair.
    let groups = DuplicateScanner::new(&engine)
        .scan(&model, "name", simple_unique::AttributeNames::none())
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].ids.len(), 2);
    assert_eq!(groups[0].value, Value::from("My Post"));
}

#[test]
fn test_declarative_config_matches_code() {
    let ctx = TestContext::new();
    let model = widget_model();
    let config = ValidationConfig::from_json(
        r#"{
            "models": {
                "Widget": [
                    {
                        "attribute": "name",
                        "scope": "category",
                        "message": "is a repeat",
                        "if": "should_validate"
                    }
                ]
            }
        }"#,
    )
    .unwrap();
    let validations = config.validations_for(Arc::clone(&model)).unwrap();

    let mut first = widget(
        &model,
        &[
            ("name", "X".into()),
            ("category", "Funny".into()),
            ("should_validate", true.into()),
        ],
    );
    validations.save(&mut first, &ctx.engine).unwrap().unwrap();

    let mut second = widget(
        &model,
        &[
            ("name", "X".into()),
            ("category", "Funny".into()),
            ("should_validate", true.into()),
        ],
    );
    assert!(!validations.validate(&mut second, &ctx.engine).unwrap());
    assert_eq!(second.errors().get("name"), ["is a repeat"]);

    second.set("should_validate", false).unwrap();
    assert!(validations.validate(&mut second, &ctx.engine).unwrap());
}
