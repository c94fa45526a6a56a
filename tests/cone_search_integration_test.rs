use httpmock::prelude::*;
use std::time::Duration;
use vo_cone::domain::table::Value;
use vo_cone::{
    ConeError, ConeSearch, CoordsInput, FailurePolicy, QuerySettings, RadiusInput, ServiceDescriptor,
    ServiceInput, SkyPosition,
};

fn votable(rows: &[(i64, f64, f64)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0"?>
<VOTABLE version="1.3">
  <RESOURCE type="results">
    <INFO name="QUERY_STATUS" value="OK"/>
    <TABLE>
      <FIELD name="id" datatype="int" ucd="ID_MAIN"/>
      <FIELD name="ra" datatype="double" unit="deg" ucd="POS_EQ_RA_MAIN"/>
      <FIELD name="dec" datatype="double" unit="deg" ucd="POS_EQ_DEC_MAIN"/>
      <DATA><TABLEDATA>
"#,
    );
    for (id, ra, dec) in rows {
        xml.push_str(&format!("<TR><TD>{}</TD><TD>{}</TD><TD>{}</TD></TR>\n", id, ra, dec));
    }
    xml.push_str("</TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>");
    xml
}

#[tokio::test]
async fn test_single_position_cone_search() {
    let server = MockServer::start();
    let scs_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/scs")
            .query_param("RA", "10.5")
            .query_param("DEC", "20.25")
            .query_param("SR", "0.1");
        then.status(200)
            .header("Content-Type", "text/xml")
            .body(votable(&[(1, 10.51, 20.24), (2, 10.49, 20.26)]));
    });

    let cone = ConeSearch::default();
    let table = cone.query(server.url("/scs"), "10.5 20.25", 0.1).await.unwrap();

    scs_mock.assert();
    assert_eq!(table.len(), 2);
    assert_eq!(table.columns[1].unit.as_deref(), Some("deg"));
    assert_eq!(table.rows[1][0], Value::Int(2));
    assert_eq!(table.meta.url.len(), 1);
    assert!(table.meta.url[0].starts_with(&server.url("/scs")));
    assert!(table.meta.url[0].contains("SR=0.1"));
    assert!(table.meta.xml_raw[0].contains("<VOTABLE"));
}

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "150");
        then.status(200).body(votable(&[(10, 150.0, 2.0)]));
    });
    let second = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "30");
        then.status(200).body(votable(&[(20, 30.0, -2.0), (21, 30.01, -2.01)]));
    });

    let cone = ConeSearch::default();
    let coords = vec!["10:00:00 +02:00:00", "30 -2"];
    let table = cone.query(server.url("/scs"), coords, vec![0.2, 0.3]).await.unwrap();

    first.assert();
    second.assert();
    let ids: Vec<&Value> = table.column_values("id").unwrap();
    assert_eq!(ids, vec![&Value::Int(10), &Value::Int(20), &Value::Int(21)]);
    assert_eq!(table.meta.url.len(), 2);
    assert_eq!(table.meta.xml_raw.len(), 2);
    assert!(table.meta.url[0].contains("RA=150"));
    assert!(table.meta.url[1].contains("RA=30"));
}

#[tokio::test]
async fn test_unreadable_response_gives_empty_table() {
    let server = MockServer::start();
    let scs_mock = server.mock(|when, then| {
        when.method(GET).path("/scs");
        then.status(200)
            .header("Content-Type", "text/html")
            .body("<html><body>No VOTable today</body></html>");
    });

    let cone = ConeSearch::default();
    let table = cone
        .query(server.url("/scs"), SkyPosition::new(1.0, 2.0).unwrap(), 0.1)
        .await
        .unwrap();

    scs_mock.assert_hits(1);
    assert!(table.is_empty());
    assert!(table.columns.is_empty());
    assert_eq!(table.meta.url.len(), 1);
    assert!(!table.meta.url[0].is_empty());
    assert_eq!(table.meta.xml_raw, vec!["<html><body>No VOTable today</body></html>"]);
}

#[tokio::test]
async fn test_decoded_result_tells_zero_matches_from_garbage() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/empty");
        then.status(200).body(votable(&[]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/garbage");
        then.status(200).body("not xml at all");
    });

    let cone = ConeSearch::default();
    let params = ConeSearch::plan(CoordsInput::from("1 2"), RadiusInput::Single(0.1)).unwrap();

    let empty = cone
        .one_cone_search_decoded(&ServiceDescriptor::new(server.url("/empty")), params[0].clone())
        .await
        .unwrap();
    assert!(empty.is_parsed());

    let garbage = cone
        .one_cone_search_decoded(&ServiceDescriptor::new(server.url("/garbage")), params[0].clone())
        .await
        .unwrap();
    assert!(!garbage.is_parsed());
    assert!(garbage.reason().is_some());
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let server = MockServer::start();
    let scs_mock = server.mock(|when, then| {
        when.method(GET).path("/scs");
        then.status(503);
    });

    let cone = ConeSearch::new(QuerySettings::default());
    let result = cone.query(server.url("/scs"), "10 20", 0.1).await;

    scs_mock.assert_hits(3);
    match result {
        Err(ConeError::RetriesExhausted { attempts, last, .. }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, ConeError::HttpStatus { status: 503, .. }));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeouts_are_retried() {
    let server = MockServer::start();
    let _slow_mock = server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .delay(Duration::from_secs(2))
            .body(votable(&[(1, 10.0, 20.0)]));
    });

    let settings = QuerySettings {
        timeout: Duration::from_millis(200),
        retries: 2,
        ..QuerySettings::default()
    };
    let cone = ConeSearch::new(settings);
    let result = cone.query(server.url("/slow"), "10 20", 0.1).await;

    match result {
        Err(ConeError::RetriesExhausted { attempts, last, .. }) => {
            assert_eq!(attempts, 2);
            assert!(matches!(*last, ConeError::Http(_)));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_continue_policy_isolates_failing_position() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "1");
        then.status(500);
    });
    let working = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "2");
        then.status(200).body(votable(&[(7, 2.0, 3.0)]));
    });

    let cone = ConeSearch::default().with_failure_policy(FailurePolicy::Continue);
    let table = cone
        .query(server.url("/scs"), vec![(1.0, 3.0), (2.0, 3.0)], 0.1)
        .await
        .unwrap();

    failing.assert_hits(3);
    working.assert_hits(1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows[0][0], Value::Int(7));
    assert_eq!(table.meta.url.len(), 1);
}

#[tokio::test]
async fn test_stop_policy_aborts_batch() {
    let server = MockServer::start();
    let failing = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "1");
        then.status(500);
    });
    let never_reached = server.mock(|when, then| {
        when.method(GET).path("/scs").query_param("RA", "2");
        then.status(200).body(votable(&[(7, 2.0, 3.0)]));
    });

    let cone = ConeSearch::default();
    let result = cone
        .query(server.url("/scs"), vec![(1.0, 3.0), (2.0, 3.0)], 0.1)
        .await;

    assert!(matches!(result, Err(ConeError::RetriesExhausted { .. })));
    failing.assert_hits(3);
    never_reached.assert_hits(0);
}

#[tokio::test]
async fn test_multiple_services_are_stacked_in_order() {
    let server_a = MockServer::start();
    let server_b = MockServer::start();

    let mock_a = server_a.mock(|when, then| {
        when.method(GET).path("/cone").query_param("table", "hip");
        then.status(200).body(votable(&[(1, 10.0, 20.0)]));
    });
    let mock_b = server_b.mock(|when, then| {
        when.method(GET).path("/cone");
        then.status(200).body(
            r#"<VOTABLE><RESOURCE><TABLE>
                <FIELD name="id" datatype="int"/>
                <FIELD name="flux" datatype="float"/>
                <DATA><TABLEDATA><TR><TD>99</TD><TD>1.5</TD></TR></TABLEDATA></DATA>
            </TABLE></RESOURCE></VOTABLE>"#,
        );
    });

    let services: Vec<ServiceInput> = vec![
        // access URLs from registries often already carry a query string
        ServiceInput::from(format!("{}?table=hip&", server_a.url("/cone"))),
        ServiceDescriptor {
            short_name: Some("B".to_string()),
            description: Some("second catalog".to_string()),
            ..ServiceDescriptor::new(server_b.url("/cone"))
        }
        .into(),
    ];

    let cone = ConeSearch::default();
    let table = cone.query_services(services, "10 20", 0.1).await.unwrap();

    mock_a.assert();
    mock_b.assert();

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "ra", "dec", "flux"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0][0], Value::Int(1));
    assert!(table.rows[0][3].is_masked());
    assert_eq!(table.rows[1][0], Value::Int(99));
    assert!(table.rows[1][1].is_masked());
    assert_eq!(table.meta.url.len(), 2);
}
