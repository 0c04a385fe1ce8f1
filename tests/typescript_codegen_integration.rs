use serde_json::{json, Value as JsonValue};

use cds2types::{generate_typescript, GeneratedOutput, GeneratorOptions};

fn bookshop() -> JsonValue {
    json!({
        "definitions": {
            "my.bookshop.Gender": {
                "kind": "type",
                "type": "cds.String",
                "enum": {"Male": {"val": "male"}, "Female": {"val": "female"}}
            },
            "my.bookshop.Priority": {
                "kind": "type",
                "type": "cds.Integer",
                "enum": {"Low": {}, "High": {"val": 3}}
            },
            "my.bookshop.Tags": {"kind": "type", "items": {"type": "cds.String"}},
            "my.bookshop.Address": {
                "kind": "type",
                "items": {"elements": {"street": {"type": "cds.String"}}}
            },
            "my.bookshop.Base": {
                "kind": "type",
                "elements": {"createdAt": {"type": "cds.Timestamp"}}
            },
            "my.bookshop.Books": {
                "kind": "entity",
                "elements": {
                    "ID": {"key": true, "type": "cds.UUID"},
                    "title": {"type": "cds.String"},
                    "stock": {"type": "cds.Integer"},
                    "author": {
                        "type": "cds.Association",
                        "target": "my.bookshop.Authors",
                        "keys": [{"ref": ["ID"]}]
                    },
                    "reviews": {
                        "type": "cds.Composition",
                        "cardinality": {"max": "*"},
                        "target": "my.bookshop.Reviews"
                    },
                    "texts": {
                        "type": "cds.Composition",
                        "cardinality": {"max": "*"},
                        "target": "my.bookshop.Books_texts"
                    }
                }
            },
            "my.bookshop.Books_texts": {
                "kind": "entity",
                "elements": {"locale": {"type": "cds.String"}}
            },
            "localized.my.bookshop.Books": {"kind": "entity", "elements": {}},
            "my.bookshop.Authors": {
                "kind": "entity",
                "elements": {
                    "ID": {"key": true, "type": "cds.UUID"},
                    "name": {"type": "cds.String"},
                    "gender": {"type": "my.bookshop.Gender"}
                }
            },
            "my.bookshop.Reviews": {
                "kind": "entity",
                "elements": {
                    "ID": {"key": true, "type": "cds.Integer"},
                    "rating": {
                        "type": "cds.Integer",
                        "enum": {"Good": {"val": 1}, "Bad": {"val": 0}}
                    }
                }
            },
            "my.bookshop.Orders": {
                "kind": "entity",
                "includes": ["my.bookshop.Base"],
                "elements": {
                    "ID": {"key": true, "type": "cds.UUID"},
                    "createdAt": {"type": "cds.Timestamp"}
                }
            },
            "CatalogService": {"kind": "service"},
            "CatalogService.Books": {
                "kind": "entity",
                "elements": {
                    "ID": {"key": true, "type": "cds.UUID"},
                    "author": {
                        "type": "cds.Association",
                        "target": "my.bookshop.Authors",
                        "keys": [{"ref": ["ID"]}]
                    }
                },
                "actions": {
                    "addReview": {
                        "kind": "action",
                        "params": {"rating": {"type": "cds.Integer"}},
                        "returns": {"type": "my.bookshop.Reviews"}
                    }
                }
            },
            "CatalogService.Favorites": {
                "kind": "entity",
                "elements": {
                    "book": {
                        "type": "cds.Association",
                        "target": "my.bookshop.Books",
                        "keys": [{"ref": ["ID"]}]
                    }
                }
            },
            "CatalogService.submitOrder": {
                "kind": "action",
                "params": {
                    "book": {"type": "cds.UUID"},
                    "quantity": {"type": "cds.Integer"}
                },
                "returns": {"type": "cds.Boolean"}
            }
        }
    })
}

fn generate(schema: &JsonValue, options: &GeneratorOptions) -> GeneratedOutput {
    generate_typescript(schema, options).expect("generate")
}

fn content<'a>(output: &'a GeneratedOutput, file_name: &str) -> &'a str {
    &output
        .file(file_name)
        .unwrap_or_else(|| panic!("missing file {file_name}"))
        .content
}

/// Text of the top-level declaration starting with `header`, up to its closing brace.
fn block<'a>(text: &'a str, header: &str) -> &'a str {
    let start = text
        .find(header)
        .unwrap_or_else(|| panic!("missing declaration {header}"));
    let end = text[start..]
        .find("\n}\n")
        .map(|offset| start + offset + 3)
        .unwrap_or(text.len());
    &text[start..end]
}

#[test]
fn writes_one_file_per_namespace_and_service() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let names: Vec<&str> = output.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["my.bookshop.ts", "CatalogService.ts"]);
    for file in &output.files {
        assert!(file.content.starts_with("// Generated by cds2types."));
    }
}

#[test]
fn string_enum_members_are_quoted() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let gender = block(content(&output, "my.bookshop.ts"), "export enum Gender {");
    assert!(gender.contains("    Male = \"male\",\n"));
    assert!(gender.contains("    Female = \"female\",\n"));
}

#[test]
fn enum_members_without_value_are_auto_numbered() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "my.bookshop.ts");

    let priority = block(ts, "export enum Priority {");
    assert!(priority.contains("    Low,\n"));
    assert!(priority.contains("    High = 3,\n"));

    let rating = block(ts, "export enum ReviewsRating {");
    assert!(rating.contains("    Good = 1,\n"));
    assert!(rating.contains("    Bad,\n"));
    assert!(block(ts, "export interface Reviews {").contains("    rating: ReviewsRating;\n"));
}

#[test]
fn entity_properties_follow_element_order_with_foreign_keys() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let books = block(content(&output, "my.bookshop.ts"), "export interface Books {");
    assert_eq!(
        books,
        concat!(
            "export interface Books {\n",
            "    ID: string;\n",
            "    title: string;\n",
            "    stock: number;\n",
            "    author?: Authors;\n",
            "    author_ID?: string;\n",
            "    reviews?: Reviews[];\n",
            "}\n"
        )
    );
}

#[test]
fn localized_text_definitions_are_dropped() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "my.bookshop.ts");
    assert!(!ts.contains("Books_texts"));
    assert!(!ts.contains("texts?:"));
    assert!(output.files.iter().all(|f| f.file_name != "localized.my.bookshop.ts"));
}

#[test]
fn type_aliases_render_arrays_and_inline_objects() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "my.bookshop.ts");
    assert!(ts.contains("export type Tags = string[];\n"));
    assert!(ts.contains("export type Address = { street: string }[];\n"));
}

#[test]
fn included_fields_surface_through_extends() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "my.bookshop.ts");
    assert!(block(ts, "export interface Base {").contains("    createdAt?: Date;\n"));

    let orders = block(ts, "export interface Orders extends Base {");
    assert!(orders.contains("    ID: string;\n"));
    assert!(!orders.contains("createdAt"));
}

#[test]
fn cross_namespace_references_are_imported_and_aliased_on_collision() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "CatalogService.ts");

    assert!(ts.contains(
        "import { Authors, Books as MyBookshopBooks, Reviews } from \"./my.bookshop\";\n"
    ));
    let favorites = block(ts, "export interface Favorites {");
    assert!(favorites.contains("    book?: MyBookshopBooks;\n"));
    assert!(favorites.contains("    book_ID?: string;\n"));

    let books = block(ts, "export interface Books {");
    assert!(books.contains("    author?: Authors;\n"));
}

#[test]
fn bound_actions_are_grouped_under_entity_namespace() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "CatalogService.ts");
    let actions = block(ts, "export namespace Books.actions {");

    assert!(actions.contains("    export enum BooksActionsActionAddReview {\n"));
    assert!(actions.contains("        name = \"addReview\",\n"));
    assert!(actions.contains("        paramRating = \"rating\",\n"));
    assert!(actions.contains("    export interface BooksActionsActionAddReviewParams {\n"));
    assert!(actions.contains("        rating: number;\n"));
    assert!(actions.contains("    export type BooksActionsActionAddReviewReturn = Reviews;\n"));
}

#[test]
fn unbound_actions_emit_enum_params_and_return() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "CatalogService.ts");

    let names = block(ts, "export enum ActionSubmitOrder {");
    assert!(names.contains("    name = \"submitOrder\",\n"));
    assert!(names.contains("    paramBook = \"book\",\n"));
    assert!(names.contains("    paramQuantity = \"quantity\",\n"));

    let params = block(ts, "export interface ActionSubmitOrderParams {");
    assert!(params.contains("    book: string;\n"));
    assert!(params.contains("    quantity: number;\n"));
    assert!(ts.contains("export type ActionSubmitOrderReturn = boolean;\n"));
}

#[test]
fn synthetic_entity_enums_close_each_file() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "CatalogService.ts");

    let entity = block(ts, "export enum Entity {");
    assert!(entity.contains("    Books = \"CatalogService.Books\",\n"));
    assert!(entity.contains("    Favorites = \"CatalogService.Favorites\",\n"));
    let sanitized = block(ts, "export enum SanitizedEntity {");
    assert!(sanitized.contains("    Books = \"Books\",\n"));

    let entity_at = ts.find("export enum Entity {").unwrap();
    let action_at = ts.find("export enum ActionSubmitOrder {").unwrap();
    assert!(action_at < entity_at);
    assert!(ts.trim_end().ends_with('}'));
}

#[test]
fn prefix_applies_to_interfaces_only() {
    let options = GeneratorOptions {
        prefix: "I".to_string(),
        ..GeneratorOptions::default()
    };
    let output = generate(&bookshop(), &options);
    let service = content(&output, "CatalogService.ts");

    assert!(service.contains("export interface IBooks {"));
    assert!(service.contains("    author?: IAuthors;\n"));
    assert!(service.contains("export namespace IBooks.actions {"));
    assert!(service.contains("export interface IBooksActionsActionAddReviewParams {"));
    assert!(service.contains("export enum BooksActionsActionAddReview {"));
    assert!(service.contains("export interface IActionSubmitOrderParams {"));
    assert!(service.contains("export type ActionSubmitOrderReturn = boolean;"));
    assert!(block(service, "export enum SanitizedEntity {").contains("    Books = \"Books\",\n"));

    let model = content(&output, "my.bookshop.ts");
    assert!(model.contains("export enum Gender {"));
    assert!(model.contains("export interface IOrders extends IBase {"));
}

#[test]
fn unresolved_types_become_unknown_with_warning() {
    let schema = json!({
        "definitions": {
            "Books": {
                "kind": "entity",
                "elements": {
                    "shelf": {"type": "my.Missing"},
                    "publisher": {"type": "cds.Association", "target": "my.Publishers"}
                }
            }
        }
    });
    let output = generate(&schema, &GeneratorOptions::default());
    let ts = content(&output, "cds.ts");
    assert!(ts.contains("    shelf: unknown;\n"));
    assert!(ts.contains("    publisher?: unknown;\n"));
    assert_eq!(output.warnings.len(), 2);
    assert!(output.warnings[0].contains("my.Missing"));
    assert!(output.warnings[1].contains("my.Publishers"));
}

#[test]
fn element_references_use_the_referenced_element_type() {
    let schema = json!({
        "definitions": {
            "Books": {
                "kind": "entity",
                "elements": {
                    "ID": {"type": "cds.Integer"},
                    "genre": {"type": "cds.String", "enum": {"Fiction": {"val": "F"}}}
                }
            },
            "restock": {
                "kind": "action",
                "params": {
                    "book": {"type": {"ref": ["Books", "ID"]}},
                    "genres": {"items": {"type": {"ref": ["Books", "genre"]}}}
                }
            }
        }
    });
    let output = generate(&schema, &GeneratorOptions::default());
    let params = block(content(&output, "cds.ts"), "export interface ActionRestockParams {");
    assert!(params.contains("    book: number;\n"));
    assert!(params.contains("    genres: BooksGenre[];\n"));
}

#[test]
fn sorted_output_is_stable_and_ordered() {
    let options = GeneratorOptions {
        sort: true,
        ..GeneratorOptions::default()
    };
    let first = generate(&bookshop(), &options);
    let second = generate(&bookshop(), &options);
    assert_eq!(first, second);

    let ts = content(&first, "my.bookshop.ts");
    let authors = ts.find("export interface Authors {").unwrap();
    let books = ts.find("export interface Books {").unwrap();
    let reviews = ts.find("export interface Reviews {").unwrap();
    assert!(authors < books && books < reviews);

    let gender = ts.find("export enum Gender {").unwrap();
    let priority = ts.find("export enum Priority {").unwrap();
    assert!(gender < priority);
}

#[test]
fn unsorted_output_keeps_document_order() {
    let output = generate(&bookshop(), &GeneratorOptions::default());
    let ts = content(&output, "my.bookshop.ts");
    let base = ts.find("export interface Base {").unwrap();
    let books = ts.find("export interface Books {").unwrap();
    let authors = ts.find("export interface Authors {").unwrap();
    assert!(base < books && books < authors);
}

#[test]
fn enum_types_without_members_become_plain_aliases() {
    let schema = json!({
        "definitions": {
            "my.Genre": {"kind": "type", "type": "cds.String", "enum": {}},
            "my.Books": {
                "kind": "entity",
                "elements": {"genre": {"type": "my.Genre"}}
            }
        }
    });
    let output = generate(&schema, &GeneratorOptions::default());
    let ts = content(&output, "my.ts");
    assert!(ts.contains("export type Genre = string;\n"));
    assert!(!ts.contains("export enum Genre"));
    assert!(block(ts, "export interface Books {").contains("    genre: Genre;\n"));
    assert!(output.warnings.is_empty());
}

#[test]
fn imports_colliding_with_inline_enums_of_array_aliases_are_aliased() {
    let schema = json!({
        "definitions": {
            "b.AddrsKind": {
                "kind": "type",
                "type": "cds.String",
                "enum": {"Home": {"val": "home"}}
            },
            "a.Addrs": {
                "kind": "type",
                "items": {
                    "elements": {
                        "kind": {"type": "cds.String", "enum": {"Work": {"val": "work"}}}
                    }
                }
            },
            "a.Foo": {
                "kind": "entity",
                "elements": {"k": {"type": "b.AddrsKind"}}
            }
        }
    });
    let output = generate(&schema, &GeneratorOptions::default());
    let ts = content(&output, "a.ts");
    assert!(ts.contains("import { AddrsKind as BAddrsKind } from \"./b\";\n"));
    assert!(ts.contains("export enum AddrsKind {"));
    assert!(block(ts, "export interface Foo {").contains("    k: BAddrsKind;\n"));
}
