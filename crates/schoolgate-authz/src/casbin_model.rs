use crate::AuthzResult;
use casbin::prelude::DefaultModel;

// A policy operation of "*" grants every operation on its resource.
const MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = r.sub == p.sub && r.obj == p.obj && (r.act == p.act || p.act == "*")
"#;

pub fn casbin_model_string() -> &'static str {
    MODEL
}

pub async fn casbin_model() -> AuthzResult<DefaultModel> {
    Ok(DefaultModel::from_str(casbin_model_string()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casbin::Model;

    #[test]
    fn model_string_contains_matcher() {
        let model = casbin_model_string();
        assert!(model.contains("[matchers]"));
        assert!(model.contains("request_definition"));
    }

    #[tokio::test]
    async fn model_builds() {
        let model = casbin_model().await.expect("model");
        let data = model.get_model();
        assert!(data.contains_key("r"));
        assert!(data.contains_key("p"));
        assert!(!data.contains_key("g"));
    }
}
