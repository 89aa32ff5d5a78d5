//! Cluster operator and work request polling against a mock OCI endpoint

mod common;

use common::clients;
use provisio_core::{
    CreateRequest, DeleteRequest, ListRequest, Operation, OperationContext, OperationErrorCode,
    OperationStatus, ReadRequest, ResourceOperator, StatusRequest, UpdateRequest,
};
use provisio_oci::resources::cluster::RESOURCE_TYPE;
use provisio_oci::{ClusterOperator, default_registry};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLUSTER_ID: &str = "ocid1.cluster.oc1..kkkk";
const COMPARTMENT_ID: &str = "ocid1.compartment.oc1..cccc";

fn accepted(work_request_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(202).insert_header("opc-work-request-id", work_request_id)
}

fn work_request(id: &str, status: &str, resources: Value) -> Value {
    json!({
        "id": id,
        "operationType": "CLUSTER_CREATE",
        "status": status,
        "compartmentId": COMPARTMENT_ID,
        "resources": resources,
        "percentComplete": 50.0,
        "timeAccepted": "2024-05-01T10:00:00Z"
    })
}

fn status_request(request_id: &str) -> StatusRequest {
    StatusRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        request_id: request_id.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_then_poll_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/20180222/clusters"))
        .and(body_partial_json(json!({
            "compartmentId": COMPARTMENT_ID,
            "vcnId": "ocid1.vcn.oc1..aaaa",
            "kubernetesVersion": "v1.29.1",
            "endpointConfig": {"subnetId": "ocid1.subnet.oc1..ssss", "isPublicIpEnabled": true}
        })))
        .respond_with(accepted("wr-1"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(work_request("wr-1", "IN_PROGRESS", json!([]))),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(work_request(
            "wr-1",
            "SUCCEEDED",
            json!([
                {"actionType": "RELATED", "entityType": "vcn", "identifier": "ocid1.vcn.oc1..aaaa"},
                {"actionType": "CREATED", "entityType": "cluster", "identifier": "r-42"}
            ]),
        )))
        .mount(&server)
        .await;

    let operator = default_registry()
        .get(RESOURCE_TYPE, clients(&server))
        .unwrap();
    let ctx = OperationContext::new();

    // PascalCase nested keys are accepted on create.
    let request = CreateRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        label: "k8s".to_string(),
        properties: json!({
            "CompartmentId": COMPARTMENT_ID,
            "VcnId": {"$ref": "formae://vcn#/Id", "$value": "ocid1.vcn.oc1..aaaa"},
            "KubernetesVersion": "v1.29.1",
            "Name": "k8s",
            "EndpointConfig": {"SubnetId": "ocid1.subnet.oc1..ssss", "IsPublicIpEnabled": true}
        })
        .to_string(),
        ..Default::default()
    };

    let created = operator.create(&ctx, &request).await.unwrap();
    assert_eq!(created.operation, Operation::Create);
    assert_eq!(created.operation_status, OperationStatus::InProgress);
    assert_eq!(created.request_id, "wr-1");
    assert!(created.resource_properties.is_none());

    let first = operator.status(&ctx, &status_request("wr-1")).await.unwrap();
    assert_eq!(first.operation, Operation::CheckStatus);
    assert_eq!(first.operation_status, OperationStatus::InProgress);
    assert_eq!(first.request_id, "wr-1");

    let done = operator.status(&ctx, &status_request("wr-1")).await.unwrap();
    assert_eq!(done.operation_status, OperationStatus::Success);
    assert_eq!(done.native_id, "r-42");
}

#[tokio::test]
async fn test_failed_work_request_reports_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(work_request("wr-2", "FAILED", json!([]))),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-2/errors"))
        .and(query_param("compartmentId", COMPARTMENT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "LimitExceeded", "message": "quota exceeded", "timestamp": "2024-05-01T10:05:00Z"},
            {"code": "InternalError"},
            {"message": "subnet full"}
        ])))
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let result = operator
        .status(&OperationContext::new(), &status_request("wr-2"))
        .await
        .unwrap();

    assert_eq!(result.operation_status, OperationStatus::Failure);
    assert_eq!(result.error_code, OperationErrorCode::NotSet);
    assert_eq!(result.status_message, "quota exceeded; subnet full");
}

#[tokio::test]
async fn test_failed_work_request_with_unreadable_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(work_request("wr-3", "FAILED", json!([]))),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-3/errors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let result = operator
        .status(&OperationContext::new(), &status_request("wr-3"))
        .await
        .unwrap();

    assert_eq!(result.operation_status, OperationStatus::Failure);
    assert!(
        result
            .status_message
            .starts_with("Work request failed (could not retrieve error details:")
    );
}

#[tokio::test]
async fn test_canceled_work_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(work_request("wr-4", "CANCELED", json!([]))),
        )
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let result = operator
        .status(&OperationContext::new(), &status_request("wr-4"))
        .await
        .unwrap();

    assert_eq!(result.operation_status, OperationStatus::Failure);
    assert_eq!(result.status_message, "Operation was canceled");
}

#[tokio::test]
async fn test_unknown_work_request_is_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/20180222/workRequests/wr-missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NotAuthorizedOrNotFound",
            "message": "work request not found"
        })))
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let err = operator
        .status(&OperationContext::new(), &status_request("wr-missing"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("wr-missing"));
}

#[tokio::test]
async fn test_update_and_delete_return_work_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CLUSTER_ID,
            "compartmentId": COMPARTMENT_ID,
            "vcnId": "ocid1.vcn.oc1..aaaa",
            "kubernetesVersion": "v1.28.2",
            "name": "k8s"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .and(body_partial_json(json!({"name": "k8s", "kubernetesVersion": "v1.29.1"})))
        .respond_with(accepted("wr-update"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .respond_with(accepted("wr-delete"))
        .expect(1)
        .mount(&server)
        .await;

    let operator = default_registry()
        .get(RESOURCE_TYPE, clients(&server))
        .unwrap();
    let ctx = OperationContext::new();

    let update = UpdateRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        native_id: CLUSTER_ID.to_string(),
        patch_document: Some(json!({"KubernetesVersion": "v1.29.1"}).to_string()),
        ..Default::default()
    };
    let updated = operator.update(&ctx, &update).await.unwrap();
    assert_eq!(updated.operation_status, OperationStatus::InProgress);
    assert_eq!(updated.request_id, "wr-update");

    let delete = DeleteRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        native_id: CLUSTER_ID.to_string(),
        ..Default::default()
    };
    let deleted = operator.delete(&ctx, &delete).await.unwrap();
    assert_eq!(deleted.operation, Operation::Delete);
    assert_eq!(deleted.operation_status, OperationStatus::InProgress);
    assert_eq!(deleted.request_id, "wr-delete");
}

#[tokio::test]
async fn test_delete_of_absent_cluster_succeeds_without_delete_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "NotAuthorizedOrNotFound",
            "message": "not found"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(accepted("wr-never"))
        .expect(0)
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let request = DeleteRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        native_id: CLUSTER_ID.to_string(),
        ..Default::default()
    };

    let result = operator
        .delete(&OperationContext::new(), &request)
        .await
        .unwrap();
    assert_eq!(result.operation_status, OperationStatus::Success);
    assert_eq!(result.native_id, CLUSTER_ID);
}

#[tokio::test]
async fn test_read_keeps_nested_api_shape() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CLUSTER_ID,
            "compartmentId": COMPARTMENT_ID,
            "vcnId": "ocid1.vcn.oc1..aaaa",
            "kubernetesVersion": "v1.29.1",
            "name": "k8s",
            "type": "ENHANCED_CLUSTER",
            "lifecycleState": "ACTIVE",
            "endpoints": {"kubernetes": "https://k8s.example:6443"},
            "endpointConfig": {"subnetId": "ocid1.subnet.oc1..ssss", "nsgIds": []},
            "options": {
                "serviceLbSubnetIds": ["ocid1.subnet.oc1..llll"],
                "kubernetesNetworkConfig": {"podsCidr": "10.244.0.0/16", "servicesCidr": "10.96.0.0/16"}
            },
            "freeformTags": {"env": "dev"}
        })))
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let request = ReadRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        native_id: CLUSTER_ID.to_string(),
        ..Default::default()
    };

    let result = operator
        .read(&OperationContext::new(), &request)
        .await
        .unwrap();
    let props: Value = serde_json::from_str(&result.properties).unwrap();

    assert_eq!(props["Id"], CLUSTER_ID);
    assert_eq!(props["Type"], "ENHANCED_CLUSTER");
    assert_eq!(props["LifecycleState"], "ACTIVE");
    assert_eq!(props["Endpoints"]["Kubernetes"], "https://k8s.example:6443");
    assert_eq!(props["EndpointConfig"]["subnetId"], "ocid1.subnet.oc1..ssss");
    assert_eq!(
        props["Options"]["kubernetesNetworkConfig"]["podsCidr"],
        "10.244.0.0/16"
    );
    assert_eq!(props["FreeformTags"]["env"], "dev");
}

#[tokio::test]
async fn test_list_skips_deleted_clusters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/20180222/clusters"))
        .and(query_param("compartmentId", COMPARTMENT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "ocid1.cluster.oc1..one", "lifecycleState": "ACTIVE"},
            {"id": "ocid1.cluster.oc1..two", "lifecycleState": "DELETED"},
            {"id": "ocid1.cluster.oc1..three", "lifecycleState": "CREATING"}
        ])))
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let request = ListRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        additional_properties: [("CompartmentId".to_string(), COMPARTMENT_ID.to_string())]
            .into_iter()
            .collect(),
        ..Default::default()
    };

    let result = operator
        .list(&OperationContext::new(), &request)
        .await
        .unwrap();
    assert_eq!(
        result.native_ids,
        vec!["ocid1.cluster.oc1..one", "ocid1.cluster.oc1..three"]
    );
    assert!(result.next_page_token.is_none());
}

#[tokio::test]
async fn test_create_accepts_type_key_emitted_by_read() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/20180222/clusters"))
        .and(body_partial_json(json!({"type": "ENHANCED_CLUSTER"})))
        .respond_with(accepted("wr-type"))
        .expect(1)
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let request = CreateRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        label: "k8s".to_string(),
        properties: json!({
            "CompartmentId": COMPARTMENT_ID,
            "VcnId": "ocid1.vcn.oc1..aaaa",
            "KubernetesVersion": "v1.29.1",
            "Type": "ENHANCED_CLUSTER"
        })
        .to_string(),
        ..Default::default()
    };

    let result = operator
        .create(&OperationContext::new(), &request)
        .await
        .unwrap();
    assert_eq!(result.request_id, "wr-type");
}

#[tokio::test]
async fn test_update_patch_on_read_options_reaches_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CLUSTER_ID,
            "compartmentId": COMPARTMENT_ID,
            "vcnId": "ocid1.vcn.oc1..aaaa",
            "kubernetesVersion": "v1.29.1",
            "options": {
                "admissionControllerOptions": {"isPodSecurityPolicyEnabled": false}
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/20180222/clusters/{}", CLUSTER_ID)))
        .and(body_partial_json(json!({
            "options": {"admissionControllerOptions": {"isPodSecurityPolicyEnabled": true}}
        })))
        .respond_with(accepted("wr-options"))
        .expect(1)
        .mount(&server)
        .await;

    let operator = ClusterOperator::new(clients(&server));
    let request = UpdateRequest {
        resource_type: RESOURCE_TYPE.to_string(),
        native_id: CLUSTER_ID.to_string(),
        patch_document: Some(
            json!([{
                "op": "replace",
                "path": "/Options/admissionControllerOptions/isPodSecurityPolicyEnabled",
                "value": true
            }])
            .to_string(),
        ),
        ..Default::default()
    };

    let result = operator
        .update(&OperationContext::new(), &request)
        .await
        .unwrap();
    assert_eq!(result.request_id, "wr-options");
}
