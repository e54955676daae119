//! Upload policy as seen by callers: checked per candidate, before credentials.

use pen2pdf_ai::catalog::{Backend, ModelCatalog};
use pen2pdf_ai::file_policy::{FilePolicy, BLOCKED_MIME_TYPES};
use pen2pdf_ai::request::RequestBuilder;
use pen2pdf_ai::{is_file_allowed, Attachment, GenerateRequest, SuiteClient, Task};

fn docx() -> Attachment {
    Attachment::new(
        "essay.docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        vec![0x50, 0x4b, 0x03, 0x04],
    )
}

#[test]
fn test_blocked_mime_always_denied_across_catalog() {
    let catalog = ModelCatalog::default();
    for backend in Backend::ALL {
        for model in catalog.list_models(backend) {
            for mime in BLOCKED_MIME_TYPES {
                assert!(
                    !is_file_allowed(&model.id, mime),
                    "{} accepted {}",
                    model.id,
                    mime
                );
                assert!(!model.file_policy.allows(mime));
            }
        }
    }
}

#[test]
fn test_descriptor_policy_matches_free_function() {
    let catalog = ModelCatalog::default();
    for model in catalog.list_models(Backend::GithubModels) {
        assert_eq!(model.file_policy, FilePolicy::for_model(&model.id));
        assert_eq!(model.capabilities.images, model.file_policy.allows("image/png"));
    }
}

#[test]
fn test_builder_names_offending_attachment() {
    let catalog = ModelCatalog::default();
    let model = catalog.resolve("gpt-4o");
    let ok = Attachment::new("scan.png", "image/png", vec![1, 2, 3]);

    let err = RequestBuilder::check_attachments(&model, &[ok, docx()]).unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("attachments[1].mime_type")
    );
}

#[tokio::test]
async fn test_disallowed_upload_is_validation_error_without_credentials() {
    // No adapters registered: a credential check would fail with a configuration error.
    let client = SuiteClient::builder().build().unwrap();
    let request = GenerateRequest::new(Task::Chat, "grade this")
        .with_model("gpt-3.5-turbo")
        .with_attachment(Attachment::new("page.png", "image/png", vec![1]));

    let err = client.generate_response(&request).await.unwrap_err();
    assert_eq!(err.kind(), "validation_error");
    assert_eq!(err.http_status(), 400);
}

#[test]
fn test_check_attachment_uses_first_candidate() {
    let client = SuiteClient::builder().build().unwrap();
    let request = GenerateRequest::new(Task::TextExtraction, "");

    assert!(client
        .check_attachment(&request, &Attachment::new("page.jpg", "image/jpeg", vec![1]))
        .is_ok());
    assert!(client.check_attachment(&request, &docx()).is_err());
}

#[test]
fn test_block_wins_when_type_is_also_allowed() {
    let policy = FilePolicy {
        allows_files: true,
        allowed_mime_types: ["text/rtf", "image/png"].iter().map(|m| m.to_string()).collect(),
        blocked_mime_types: ["text/rtf"].iter().map(|m| m.to_string()).collect(),
    };
    assert!(!policy.allows("text/rtf"));
    assert!(!policy.allows("TEXT/RTF; charset=utf-8"));
    assert!(policy.allows("image/png"));
}
