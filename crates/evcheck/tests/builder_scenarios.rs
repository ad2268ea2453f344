use evcheck::builder::Builder;
use evcheck::validators::gravatar::GravatarValidator;
use evcheck::{Address, Input, ValidationError, ValidatorName, Validator};
use std::sync::Arc;

// End-to-end scenario 1 (spec §8): a syntactically invalid address makes
// Gravatar short-circuit with DepsErr rather than attempting a network call.
#[tokio::test]
async fn invalid_syntax_short_circuits_gravatar_with_deps_error() {
    let composite = Builder::empty()
        .set(
            ValidatorName::new("syntaxValidator"),
            Arc::new(evcheck::validators::syntax::SyntaxValidator),
        )
        .set(
            ValidatorName::new("gravatarValidator"),
            Arc::new(GravatarValidator::new()),
        )
        .build();

    let input = Input::new(Address::from_string("some%..@invalid.%.email"));
    let result = composite.validate(&input).await.unwrap();

    assert!(!result.is_valid());
    let syntax = result.get(&ValidatorName::new("syntaxValidator")).unwrap();
    assert!(!syntax.is_valid());

    let gravatar = result.get(&ValidatorName::new("gravatarValidator")).unwrap();
    assert!(!gravatar.is_valid());
    assert_eq!(gravatar.errors(), &[ValidationError::Deps]);
}
