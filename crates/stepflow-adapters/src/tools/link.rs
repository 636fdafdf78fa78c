use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ArtifactMap, LinkSpec, Table, TransformError, Transformable};

/// Trae artifacts de un tool de otra chain. El engine los inyecta en las
/// entradas como `{artifact}_{tool}`; aquí sólo se reexponen junto a `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTool {
    pub chain: String,
    pub tool: String,
    pub artifacts: Vec<String>,
}

impl LinkTool {
    pub const KIND: &'static str = "link";
}

impl Transformable for LinkTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, data: Table, other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        let spec = self.spec();
        for art in &self.artifacts {
            let name = spec.injected_name(art);
            if !other.contains_key(&name) {
                return Err(TransformError::MissingArtifact(name));
            }
        }
        Ok((data, other.clone()))
    }

    fn linked_artifacts(&self) -> Option<LinkSpec> {
        Some(self.spec())
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

impl LinkTool {
    fn spec(&self) -> LinkSpec {
        LinkSpec { chain: self.chain.clone(),
                   tool: self.tool.clone(),
                   artifacts: self.artifacts.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stepflow_core::Artifact;

    #[test]
    fn requires_injected_artifacts() {
        let t = LinkTool { chain: "other".into(),
                           tool: "fit".into(),
                           artifacts: vec!["model".into()] };
        let data = Table::new(vec!["a".into()]).unwrap();
        assert!(matches!(t.transform(data.clone(), &ArtifactMap::new()),
                         Err(TransformError::MissingArtifact(n)) if n == "model_fit"));
        let mut other = ArtifactMap::new();
        other.insert("model_fit".into(), Artifact::object("model_fit", &json!({"k": 1})).unwrap());
        let (_, out) = t.transform(data, &other).unwrap();
        assert!(out.contains_key("model_fit"));
        assert_eq!(t.linked_artifacts().unwrap().chain, "other");
    }
}
