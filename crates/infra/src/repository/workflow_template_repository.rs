//! # WorkflowTemplateRepository
//!
//! ワークフローテンプレートの参照を担当するリポジトリ。
//!
//! テンプレートは起動時に JSON ファイル（配列）から読み込み、以後は読み取り専用。
//! 読み込み時に各テンプレートを検証し、ID またはドキュメント種別が重複していれば
//! 起動を失敗させる。

use std::path::Path;

use async_trait::async_trait;
use shoninflow_domain::workflow::WorkflowTemplate;

use crate::error::InfraError;

#[async_trait]
pub trait WorkflowTemplateRepository: Send + Sync {
    /// 全テンプレートをドキュメント種別順で取得
    async fn find_all(&self) -> Result<Vec<WorkflowTemplate>, InfraError>;

    /// ドキュメント種別でテンプレートを取得
    async fn find_by_document_type(
        &self,
        document_type: &str,
    ) -> Result<Option<WorkflowTemplate>, InfraError>;
}

/// 読み込み済みテンプレートを保持する実装
#[derive(Debug, Clone, Default)]
pub struct StaticWorkflowTemplateRepository {
    templates: Vec<WorkflowTemplate>,
}

impl StaticWorkflowTemplateRepository {
    /// テンプレートを検証して保持する
    ///
    /// # Errors
    ///
    /// - テンプレート定義がドメイン検証に失敗した
    /// - ID またはドキュメント種別が重複している
    pub fn new(mut templates: Vec<WorkflowTemplate>) -> Result<Self, InfraError> {
        for (i, template) in templates.iter().enumerate() {
            template.validate()?;
            let earlier = &templates[..i];
            if earlier.iter().any(|t| t.id == template.id) {
                return Err(InfraError::invalid_data(format!(
                    "テンプレート ID {} が重複しています",
                    template.id
                )));
            }
            if earlier.iter().any(|t| t.document_type == template.document_type) {
                return Err(InfraError::invalid_data(format!(
                    "ドキュメント種別 {} のテンプレートが重複しています",
                    template.document_type
                )));
            }
        }
        templates.sort_by(|a, b| a.document_type.cmp(&b.document_type));
        Ok(Self { templates })
    }

    /// JSON 文字列から読み込む
    pub fn from_json(json: &str) -> Result<Self, InfraError> {
        let templates: Vec<WorkflowTemplate> = serde_json::from_str(json)?;
        Self::new(templates)
    }

    /// JSON ファイルから読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InfraError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let repository = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            count = repository.templates.len(),
            "ワークフローテンプレートを読み込みました"
        );
        Ok(repository)
    }
}

#[async_trait]
impl WorkflowTemplateRepository for StaticWorkflowTemplateRepository {
    async fn find_all(&self) -> Result<Vec<WorkflowTemplate>, InfraError> {
        Ok(self.templates.clone())
    }

    async fn find_by_document_type(
        &self,
        document_type: &str,
    ) -> Result<Option<WorkflowTemplate>, InfraError> {
        Ok(self
            .templates
            .iter()
            .find(|t| t.document_type == document_type)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use shoninflow_domain::workflow::WorkflowTemplateId;

    use super::*;
    use crate::error::InfraErrorKind;

    const TEMPLATES: &str = r#"[
        {
            "id": "0190f2c4-0000-7000-8000-000000000002",
            "document_type": "travel_expense",
            "name": "出張旅費精算",
            "default_strategy": {"type": "parallel"},
            "default_approvers": ["mgr-1", "acct-1"]
        },
        {
            "id": "0190f2c4-0000-7000-8000-000000000001",
            "document_type": "purchase_request",
            "name": "購買申請",
            "default_strategy": {
                "type": "conditional",
                "rules": [
                    {"attribute": "amount", "operator": "gte", "value": 100000, "approvers": ["cfo"]}
                ]
            },
            "default_approvers": ["pm-1", "cfo"],
            "sla_days": 5
        }
    ]"#;

    #[tokio::test]
    async fn test_find_allはドキュメント種別順で返す() {
        let sut = StaticWorkflowTemplateRepository::from_json(TEMPLATES).unwrap();

        let templates = sut.find_all().await.unwrap();

        assert_eq!(
            templates
                .iter()
                .map(|t| t.document_type.as_str())
                .collect::<Vec<_>>(),
            vec!["purchase_request", "travel_expense"]
        );
    }

    #[tokio::test]
    async fn test_find_by_document_typeでテンプレートを取得できる() {
        let sut = StaticWorkflowTemplateRepository::from_json(TEMPLATES).unwrap();

        let found = sut
            .find_by_document_type("purchase_request")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            found.id,
            WorkflowTemplateId::from_uuid("0190f2c4-0000-7000-8000-000000000001".parse().unwrap())
        );
        assert_eq!(found.name, "購買申請");
        assert_eq!(found.sla_days, Some(5));
        assert_eq!(sut.find_by_document_type("unknown").await.unwrap(), None);
    }

    #[rstest]
    #[case(r#"[{"id": "0190f2c4-0000-7000-8000-000000000001", "document_type": "a", "name": "A", "default_strategy": {"type": "sequential"}, "default_approvers": []}]"#)]
    #[case(r#"[{"id": "0190f2c4-0000-7000-8000-000000000001", "document_type": "a", "name": "A", "default_strategy": {"type": "sequential"}, "default_approvers": ["x"]},
               {"id": "0190f2c4-0000-7000-8000-000000000002", "document_type": "a", "name": "B", "default_strategy": {"type": "sequential"}, "default_approvers": ["x"]}]"#)]
    fn test_不正なテンプレート定義は拒否する(#[case] json: &str) {
        let error = StaticWorkflowTemplateRepository::from_json(json).unwrap_err();

        assert!(matches!(error.kind(), InfraErrorKind::InvalidData(_)));
    }

    #[test]
    fn test_jsonとして不正ならシリアライズエラー() {
        let error = StaticWorkflowTemplateRepository::from_json("{").unwrap_err();

        assert!(matches!(error.kind(), InfraErrorKind::Serialization(_)));
    }

    #[test]
    fn test_ファイルが存在しなければioエラー() {
        let error =
            StaticWorkflowTemplateRepository::from_json_file("/nonexistent/templates.json")
                .unwrap_err();

        assert!(matches!(error.kind(), InfraErrorKind::Io(_)));
    }
}
