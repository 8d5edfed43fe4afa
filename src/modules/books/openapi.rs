use serde_json::{json, Value};

use super::models::{DEFAULT_LIMIT, MAX_LIMIT};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn query_param(name: &str, description: &str, schema: Value) -> Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": schema
    })
}

fn id_param() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64", "minimum": 1 }
    })
}

fn paging_params() -> Vec<Value> {
    vec![
        query_param(
            "limit",
            "Page size",
            json!({ "type": "integer", "minimum": 1, "maximum": MAX_LIMIT, "default": DEFAULT_LIMIT }),
        ),
        query_param(
            "offset",
            "Rows to skip",
            json!({ "type": "integer", "minimum": 0, "default": 0 }),
        ),
    ]
}

fn catalog_params(paged: bool) -> Vec<Value> {
    let mut params = vec![
        query_param(
            "q",
            "Case-insensitive title substring",
            json!({ "type": "string" }),
        ),
        query_param(
            "created_from",
            "First creation day, inclusive (UTC)",
            json!({ "type": "string", "format": "date" }),
        ),
        query_param(
            "created_to",
            "Last creation day, inclusive (UTC)",
            json!({ "type": "string", "format": "date" }),
        ),
        query_param(
            "include_deleted",
            "Include soft-deleted books",
            json!({ "type": "boolean", "default": false }),
        ),
    ];
    if paged {
        params.extend(paging_params());
    }
    params
}

fn trash_params(paged: bool) -> Vec<Value> {
    let mut params = vec![
        query_param(
            "q",
            "Case-insensitive title substring",
            json!({ "type": "string" }),
        ),
        query_param(
            "deleted_from",
            "First deletion day, inclusive (UTC)",
            json!({ "type": "string", "format": "date" }),
        ),
        query_param(
            "deleted_to",
            "Last deletion day, inclusive (UTC)",
            json!({ "type": "string", "format": "date" }),
        ),
    ];
    if paged {
        params.extend(paging_params());
    }
    params
}

/// OpenAPI fragment for the books module, with paths relative to its root.
pub fn document() -> Value {
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let books = json!({ "type": "array", "items": { "$ref": "#/components/schemas/Book" } });
    let total = json!({ "$ref": "#/components/schemas/Total" });
    let update_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/UpdateBook" }
            }
        }
    });
    let update = |summary: &str| {
        json!({
            "summary": summary,
            "tags": ["Books"],
            "parameters": [id_param()],
            "requestBody": update_body,
            "responses": {
                "200": json_response("Updated book", book.clone()),
                "404": error_response("Book not found or soft-deleted"),
                "409": error_response("Another active book has this title and author"),
                "422": error_response("Validation error")
            }
        })
    };

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": catalog_params(true),
                    "responses": {
                        "200": json_response("Books, newest first", books.clone()),
                        "422": error_response("Validation error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Created book", book.clone()),
                        "400": error_response("Malformed request body"),
                        "409": error_response("An active book has this title and author"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/count": {
                "get": {
                    "summary": "Count books",
                    "tags": ["Books"],
                    "parameters": catalog_params(false),
                    "responses": {
                        "200": json_response("Matching books", total.clone()),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/trash": {
                "get": {
                    "summary": "List soft-deleted books",
                    "tags": ["Books"],
                    "parameters": trash_params(true),
                    "responses": {
                        "200": json_response("Soft-deleted books, most recently deleted first", books),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/trash/count": {
                "get": {
                    "summary": "Count soft-deleted books",
                    "tags": ["Books"],
                    "parameters": trash_params(false),
                    "responses": {
                        "200": json_response("Matching soft-deleted books", total),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [
                        id_param(),
                        query_param(
                            "include_deleted",
                            "Return the book even if soft-deleted",
                            json!({ "type": "boolean", "default": false })
                        )
                    ],
                    "responses": {
                        "200": json_response("Book", book.clone()),
                        "404": error_response("Book not found"),
                        "422": error_response("Validation error")
                    }
                },
                "put": update("Update a book"),
                "patch": update("Partially update a book"),
                "delete": {
                    "summary": "Move a book to the trash",
                    "tags": ["Books"],
                    "parameters": [
                        id_param(),
                        query_param(
                            "deleted_by",
                            "Actor recorded on the book",
                            json!({ "type": "string", "minLength": 1, "maxLength": 255, "default": "system" })
                        )
                    ],
                    "responses": {
                        "204": { "description": "Soft-deleted" },
                        "404": error_response("Book not found or already soft-deleted"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/{id}/restore": {
                "put": {
                    "summary": "Restore a soft-deleted book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "200": json_response("Restored book", book.clone()),
                        "404": error_response("Book not found, not soft-deleted, or its title and author are active again")
                    }
                }
            },
            "/{id}/hard_delete": {
                "delete": {
                    "summary": "Permanently delete a soft-deleted book",
                    "tags": ["Books"],
                    "parameters": [id_param()],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "404": error_response("Book not found"),
                        "409": error_response("Book is still active")
                    }
                }
            }
        },
        "components": {
            "schemas": schemas()
        }
    })
}

fn schemas() -> Value {
    let text = json!({ "type": "string", "minLength": 1, "maxLength": 255 });
    let timestamp = json!({ "type": "string", "format": "date-time" });

    json!({
        "Book": {
            "type": "object",
            "properties": {
                "id": { "type": "integer", "format": "int64" },
                "title": text,
                "author": text,
                "created_at": timestamp,
                "created_by": text,
                "deleted_at": { "type": ["string", "null"], "format": "date-time" },
                "deleted_by": { "type": ["string", "null"] }
            },
            "required": ["id", "title", "author", "created_at", "created_by", "deleted_at", "deleted_by"]
        },
        "CreateBook": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "title": text,
                "author": text,
                "created_by": { "type": "string", "minLength": 1, "maxLength": 255, "default": "system" }
            },
            "required": ["title", "author"]
        },
        "UpdateBook": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "title": text,
                "author": text,
                "created_by": text
            }
        },
        "Total": {
            "type": "object",
            "properties": { "total": { "type": "integer", "format": "int64" } },
            "required": ["total"]
        }
    })
}
