//! Diesel table definitions for the documentation hosting service.
//!
//! Tables: docs_repos, docs_revisions, docs_artifacts.
//! Uniqueness lives in the bootstrap migration: (hosting, owner, name) on
//! docs_repos, (repo_id, sha) on docs_revisions, (revision_id, path) on
//! docs_artifacts.

diesel::table! {
    docs_repos (id) {
        id -> Int8,
        hosting -> Varchar,
        owner -> Varchar,
        name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    docs_revisions (id) {
        id -> Int8,
        repo_id -> Int8,
        sha -> Varchar,
        error -> Nullable<Varchar>,
        error_description -> Nullable<Text>,
        generated_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    docs_artifacts (id) {
        id -> Int8,
        revision_id -> Int8,
        path -> Varchar,
        content -> Bytea,
        last_modified -> Timestamptz,
        created_at -> Timestamptz,
    }
}

// Foreign key relationships
diesel::joinable!(docs_revisions -> docs_repos (repo_id));
diesel::joinable!(docs_artifacts -> docs_revisions (revision_id));

diesel::allow_tables_to_appear_in_same_query!(docs_repos, docs_revisions, docs_artifacts,);
