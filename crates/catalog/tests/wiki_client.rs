use envrec_catalog::{WikiClient, WikiConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entity_page(read: &[&str], write: &[&str]) -> String {
    let mut html = String::from(r#"<html><body><a title="Property:P31" href="/wiki/Property:P31">instance of</a><a title="Q7397" href="/wiki/Q7397">software</a>"#);
    html.push_str(r#"<a title="Property:P1072" href="/wiki/Property:P1072">readable</a>"#);
    for tag in read {
        html.push_str(&format!(r#"<a title="{tag}" href="/wiki/{tag}">{tag}</a>"#));
    }
    html.push_str(r#"<a title="Property:P1073" href="/wiki/Property:P1073">writable</a>"#);
    for tag in write {
        html.push_str(&format!(r#"<a title="{tag}" href="/wiki/{tag}">{tag}</a>"#));
    }
    html.push_str(r#"<a title="Property:P856" href="/wiki/Property:P856">website</a><a title="Q5" href="/wiki/Q5">x</a></body></html>"#);
    html
}

async fn client_for(server: &MockServer) -> WikiClient {
    WikiClient::new(&WikiConfig {
        base_url: server.uri(),
    })
    .unwrap()
}

#[tokio::test]
async fn build_catalog_scrapes_each_application_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Q11261"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(entity_page(&["Q1", "Q2"], &["Q2"])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Q698"))
        .respond_with(ResponseTemplate::new(200).set_body_string(entity_page(&["Q3"], &[])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let catalog = client
        .build_catalog(&["Q11261", "Q698", "Q11261"])
        .await
        .unwrap();

    assert_eq!(catalog.len(), 2);
    let office = catalog.get("Q11261").unwrap();
    assert_eq!(office.read_formats, vec!["Q1", "Q2"]);
    assert_eq!(office.write_formats, vec!["Q2"]);
    assert_eq!(catalog.read_formats("Q698").unwrap(), ["Q3".to_string()]);
}

#[tokio::test]
async fn failed_page_yields_empty_support() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Q404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let catalog = client.build_catalog(&["Q404"]).await.unwrap();
    let support = catalog.get("Q404").unwrap();
    assert!(support.read_formats.is_empty());
    assert!(support.write_formats.is_empty());
}

#[tokio::test]
async fn applications_supporting_checks_each_linking_entity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Special:WhatLinksHere/Q86920"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/wiki/Q86920" title="Text file">t</a>
               <a href="/wiki/Q11272" title="Notepad">n</a>
               <a href="/wiki/Q698" title="Vim">v</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Q11272"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(entity_page(&["Q86920"], &["Q86920"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Q698"))
        .respond_with(ResponseTemplate::new(200).set_body_string(entity_page(&["Q86920"], &[])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let users = client.applications_supporting("Q86920").await.unwrap();
    assert_eq!(users.readers, vec!["Q11272", "Q698"]);
    assert_eq!(users.writers, vec!["Q11272"]);
}
