use crate::Conf;
use crate::Error;
use crate::LogMode;
use crate::RequireConf;

const DEMO: &str = include_str!("../../../portcullis.yaml");

fn demo() -> Conf {
    serde_yaml::from_str(DEMO).unwrap()
}

fn invalid_reason(conf: &Conf) -> String {
    let error = crate::validate(conf).unwrap_err();
    match error.downcast_ref::<Error>() {
        Some(Error::Invalid(reason)) => reason.clone(),
        _ => panic!("unexpected validation error {:?}", error),
    }
}

#[test]
fn demo_conf_is_valid() {
    let conf = demo();
    crate::validate(&conf).unwrap();
    assert_eq!(conf.http.bind, "127.0.0.1:8080");
    assert_eq!(conf.logging.mode, LogMode::Terminal);
    assert!(conf.logging.async_flush);
    assert_eq!(conf.auth.users.len(), 4);
    assert_eq!(conf.auth.robot.as_ref().unwrap().header, "x-robot-secret");
}

#[test]
fn demo_conf_requirements() {
    let conf = demo();
    let routes = &conf.auth.routes;
    assert_eq!(routes[0].require, RequireConf::PermitAll);
    assert_eq!(routes[4].require, RequireConf::Capability("admin".into()));
    assert_eq!(routes[5].require, RequireConf::Authenticated);
}

#[test]
fn nested_requirements_as_maps() {
    let yaml = r#"
auth:
  routes:
    - pattern: /reports/**
      require:
        all:
          - capability: user
          - not:
              any-capability: [banned, robot]
    - pattern: /**
      require: deny-all
"#;
    let conf: Conf = serde_yaml::from_str(yaml).unwrap();
    let expected = RequireConf::All(vec![
        RequireConf::Capability("user".into()),
        RequireConf::Not(Box::new(RequireConf::AnyCapability(vec![
            "banned".into(),
            "robot".into(),
        ]))),
    ]);
    assert_eq!(conf.auth.routes[0].require, expected);
    assert_eq!(conf.auth.routes[1].require, RequireConf::DenyAll);

    let encoded = serde_yaml::to_string(&conf.auth.routes[0]).unwrap();
    assert!(encoded.contains("capability: user"));
}

#[test]
fn defaults() {
    let conf: Conf = serde_yaml::from_str("{}").unwrap();
    assert_eq!(conf, Conf::default());
    assert_eq!(conf.runtime.shutdown_grace_sec, 30);
    assert!(conf.auth.robot.is_none());
}

#[test]
fn routes_required() {
    let conf = Conf::default();
    assert_eq!(invalid_reason(&conf), "at least one route rule is required");
}

#[test]
fn invalid_route_pattern() {
    let mut conf = demo();
    conf.auth.routes[0].pattern = "admin".into();
    assert_eq!(invalid_reason(&conf), "route 'admin' is not valid");
}

#[test]
fn duplicate_users() {
    let mut conf = demo();
    let alice = conf.auth.users[0].clone();
    conf.auth.users.push(alice);
    assert_eq!(
        invalid_reason(&conf),
        "user 'alice' is defined more than once"
    );
}

#[test]
fn denial_locations_differ() {
    let mut conf = demo();
    if let Some(denial) = conf.auth.denial.as_mut() {
        denial.denied = denial.login.clone();
    }
    assert!(invalid_reason(&conf).starts_with("login and denied locations must differ"));
}

#[test]
fn missing_file() {
    let error = crate::load("/path/to/nowhere/portcullis.yaml").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::PathNotFound(_))
    ));
}
