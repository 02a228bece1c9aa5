//! End-to-end DDL loads across every engine.

use oxide_ddl::{Engine, LoadError, Loader};
use oxide_orm::{
    Config, DataType, DeclaredModel, FieldDef, Model, ModelDef, RelationDef, RelationKind,
    Trigger, TriggerEvent, TriggerTime, ViewDef,
};

fn id() -> FieldDef {
    FieldDef::new("id", DataType::Uint).primary_key()
}

fn user() -> ModelDef {
    ModelDef::new("User")
        .field(id())
        .field(FieldDef::new("name", DataType::String))
        .has_many("Pets", "Pet")
}

fn pet() -> ModelDef {
    ModelDef::new("Pet")
        .field(id())
        .field(FieldDef::new("user_id", DataType::Uint))
}

fn audited_user() -> DeclaredModel {
    let mut model = DeclaredModel::from(user());
    model.triggers.push(Trigger::new(
        "user_audit",
        TriggerTime::After,
        TriggerEvent::Insert,
        "INSERT INTO user_audit (name) VALUES (NEW.name)",
    ));
    model
}

fn lines(sql: &str) -> Vec<&str> {
    sql.lines().collect()
}

#[test]
fn test_mysql_tables_constraints_triggers() {
    let (u, p) = (audited_user(), pet());
    let sql = Loader::new("mysql").load(&[&u, &p]).unwrap();
    assert_eq!(
        lines(&sql),
        vec![
            "CREATE TABLE `users` (`id` bigint unsigned AUTO_INCREMENT,`name` longtext,PRIMARY KEY (`id`));",
            "CREATE TABLE `pets` (`id` bigint unsigned AUTO_INCREMENT,`user_id` bigint unsigned,PRIMARY KEY (`id`));",
            "ALTER TABLE `pets` ADD CONSTRAINT `fk_users_pets` FOREIGN KEY (`user_id`) REFERENCES `users`(`id`);",
            "CREATE TRIGGER `user_audit` AFTER INSERT ON `users` FOR EACH ROW INSERT INTO user_audit (name) VALUES (NEW.name);",
        ]
    );
}

#[test]
fn test_referenced_tables_come_first() {
    let (u, p) = (user(), pet());
    let sql = Loader::new("mysql").load(&[&p, &u]).unwrap();
    let users = sql.find("CREATE TABLE `users`").unwrap();
    let pets = sql.find("CREATE TABLE `pets`").unwrap();
    assert!(users < pets);
}

#[test]
fn test_independent_models_every_engine() {
    let models: Vec<ModelDef> = ["Alpha", "Beta", "Gamma"]
        .into_iter()
        .map(|name| ModelDef::new(name).field(id()))
        .collect();
    let refs: Vec<&dyn Model> = models.iter().map(|m| m as &dyn Model).collect();

    for engine in Engine::ALL {
        let sql = Loader::new(engine.name()).load(&refs).unwrap();
        let creates = sql.lines().filter(|l| l.starts_with("CREATE TABLE")).count();
        assert_eq!(creates, 3, "{engine}: {sql}");
        assert!(!sql.contains("ALTER TABLE"), "{engine}: {sql}");
        assert!(sql.lines().all(|l| l.ends_with(';')));
    }
}

#[test]
fn test_loads_are_deterministic() {
    let (u, p) = (audited_user(), pet());
    let c = ModelDef::new("Collar")
        .field(id())
        .field(FieldDef::new("pet_id", DataType::Uint))
        .belongs_to("Pet", "Pet");
    for engine in Engine::ALL {
        let first = Loader::new(engine.name()).load(&[&u, &p, &c]).unwrap();
        let second = Loader::new(engine.name()).load(&[&u, &p, &c]).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_mirrored_relationship_emits_one_constraint() {
    let u = user();
    let p = pet().belongs_to("User", "User");
    let sql = Loader::new("postgres").load(&[&u, &p]).unwrap();
    assert_eq!(sql.matches("FOREIGN KEY").count(), 1);
    assert!(sql.contains(r#"ALTER TABLE "pets" ADD CONSTRAINT "fk_users_pets""#));
}

#[test]
fn test_ignored_relationship() {
    let u = ModelDef::new("User")
        .field(id())
        .relation(RelationDef::new("Pets", RelationKind::HasMany, "Pet").ignore_migration());
    let p = pet();
    let sql = Loader::new("mysql").load(&[&u, &p]).unwrap();
    assert!(!sql.contains("FOREIGN KEY"));
    assert_eq!(sql.lines().count(), 2);
}

#[test]
fn test_disabled_foreign_keys() {
    let (u, p) = (user(), pet());
    let config = Config {
        disable_foreign_key_constraint_when_migrating: true,
        ..Config::default()
    };
    for engine in Engine::ALL {
        let sql = Loader::new(engine.name())
            .with_config(config.clone())
            .load(&[&u, &p])
            .unwrap();
        assert!(!sql.contains("FOREIGN KEY"), "{engine}: {sql}");
    }
}

#[test]
fn test_sqlite_inlines_foreign_keys() {
    let (u, p) = (audited_user(), pet());
    let sql = Loader::new("sqlite").load(&[&u, &p]).unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE `users` (`id` integer PRIMARY KEY AUTOINCREMENT,`name` text);\n\
         CREATE TABLE `pets` (`id` integer PRIMARY KEY AUTOINCREMENT,`user_id` integer,\
         CONSTRAINT `fk_users_pets` FOREIGN KEY (`user_id`) REFERENCES `users`(`id`));\n\
         CREATE TRIGGER `user_audit` AFTER INSERT ON `users` FOR EACH ROW\n\
         BEGIN\n  INSERT INTO user_audit (name) VALUES (NEW.name);\nEND;\n"
    );
    assert!(!sql.contains("ALTER TABLE"));
}

#[test]
fn test_postgres_smoke() {
    let (u, p) = (audited_user(), pet());
    let sql = Loader::new("postgres").load(&[&u, &p]).unwrap();
    let expected_prefix = "CREATE TABLE \"users\" (\"id\" bigserial,\"name\" text,PRIMARY KEY (\"id\"));\n\
         CREATE TABLE \"pets\" (\"id\" bigserial,\"user_id\" bigint,PRIMARY KEY (\"id\"));\n\
         ALTER TABLE \"pets\" ADD CONSTRAINT \"fk_users_pets\" FOREIGN KEY (\"user_id\") REFERENCES \"users\"(\"id\");\n\
         CREATE OR REPLACE FUNCTION \"user_audit_func\"() RETURNS TRIGGER AS $$\n";
    assert!(sql.starts_with(expected_prefix), "{sql}");
    assert!(sql.ends_with("EXECUTE FUNCTION \"user_audit_func\"();\n"));
}

#[test]
fn test_sqlserver_smoke() {
    let (u, p) = (user(), pet());
    let sql = Loader::new("sqlserver").load(&[&u, &p]).unwrap();
    assert_eq!(
        lines(&sql),
        vec![
            "CREATE TABLE \"users\" (\"id\" bigint IDENTITY(1,1),\"name\" nvarchar(MAX),PRIMARY KEY (\"id\"));",
            "CREATE TABLE \"pets\" (\"id\" bigint IDENTITY(1,1),\"user_id\" bigint,PRIMARY KEY (\"id\"));",
            "ALTER TABLE \"pets\" ADD CONSTRAINT \"fk_users_pets\" FOREIGN KEY (\"user_id\") REFERENCES \"users\"(\"id\");",
        ]
    );
}

#[test]
fn test_generated_join_table() {
    let u = ModelDef::new("User")
        .field(id())
        .many_to_many("Languages", "Language");
    let l = ModelDef::new("Language").field(id());
    let sql = Loader::new("mysql").load(&[&u, &l]).unwrap();
    assert_eq!(
        lines(&sql),
        vec![
            "CREATE TABLE `users` (`id` bigint unsigned AUTO_INCREMENT,PRIMARY KEY (`id`));",
            "CREATE TABLE `languages` (`id` bigint unsigned AUTO_INCREMENT,PRIMARY KEY (`id`));",
            "CREATE TABLE `user_languages` (`user_id` bigint unsigned,`language_id` bigint unsigned,PRIMARY KEY (`user_id`,`language_id`));",
            "ALTER TABLE `user_languages` ADD CONSTRAINT `fk_user_languages_language` FOREIGN KEY (`language_id`) REFERENCES `languages`(`id`);",
            "ALTER TABLE `user_languages` ADD CONSTRAINT `fk_user_languages_user` FOREIGN KEY (`user_id`) REFERENCES `users`(`id`);",
        ]
    );
}

#[test]
fn test_custom_join_table() {
    let person = ModelDef::new("Person")
        .field(id())
        .many_to_many("Addresses", "Address");
    let address = ModelDef::new("Address").field(id());
    let join = ModelDef::new("PersonAddress")
        .field(FieldDef::new("person_id", DataType::Uint).primary_key())
        .field(FieldDef::new("address_id", DataType::Uint).primary_key())
        .field(FieldDef::new("created_at", DataType::Time));

    let sql = Loader::new("postgres")
        .with_join_table(&person, "Addresses", &join)
        .load(&[&person, &address])
        .unwrap();
    assert!(sql.contains(r#"CREATE TABLE "person_addresses" ("#));
    assert!(sql.contains(r#""created_at" timestamptz"#));
    assert!(sql.contains(r#"ADD CONSTRAINT "fk_person_addresses_person""#));
    assert!(sql.contains(r#"ADD CONSTRAINT "fk_person_addresses_address""#));
}

#[test]
fn test_declared_custom_join_table() {
    let person = ModelDef::new("Person")
        .table("people")
        .field(id())
        .many_to_many("Addresses", "Address");
    let address = ModelDef::new("Address").field(id());
    let join = ModelDef::new("PersonAddress")
        .field(FieldDef::new("person_id", DataType::Uint).primary_key())
        .field(FieldDef::new("address_id", DataType::Uint).primary_key());

    let sql = Loader::new("mysql")
        .with_join_table(&person, "Addresses", &join)
        .load(&[&person, &address, &join])
        .unwrap();
    assert_eq!(sql.matches("FOREIGN KEY").count(), 2);
    assert_eq!(sql.matches("CREATE TABLE `person_addresses`").count(), 1);
    assert!(sql.contains(
        "ADD CONSTRAINT `fk_person_addresses_person` FOREIGN KEY (`person_id`) REFERENCES `people`(`id`)"
    ));
    assert!(sql.contains(
        "ADD CONSTRAINT `fk_person_addresses_address` FOREIGN KEY (`address_id`) REFERENCES `addresses`(`id`)"
    ));

    let join_table = sql.find("CREATE TABLE `person_addresses`").unwrap();
    assert!(sql.find("CREATE TABLE `people`").unwrap() < join_table);
    assert!(sql.find("CREATE TABLE `addresses`").unwrap() < join_table);
}

#[test]
fn test_views_follow_tables() {
    let u = ModelDef::new("User").field(id());
    let mut active = DeclaredModel::from(ModelDef::new("ActiveUser").field(id()));
    active.view = Some(ViewDef::new("SELECT id FROM users"));
    let sql = Loader::new("mysql").load(&[&active, &u]).unwrap();
    assert_eq!(
        lines(&sql),
        vec![
            "CREATE TABLE `users` (`id` bigint unsigned AUTO_INCREMENT,PRIMARY KEY (`id`));",
            "CREATE VIEW `active_users` AS SELECT id FROM users;",
        ]
    );
}

#[test]
fn test_unknown_engine() {
    let err = Loader::new("oracle").load(&[]).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedEngine(ref e) if e == "oracle"));
}

#[test]
fn test_unknown_relation_target() {
    let u = user();
    let err = Loader::new("mysql").load(&[&u]).unwrap_err();
    assert!(err.to_string().contains("unknown model Pet"));
}
