use anyhow::Result;
use futures_util::{sink::SinkExt, stream::StreamExt, TryStreamExt};
use grpcio::{ChannelBuilder, EnvBuilder, RpcStatusCode, Server};
use p4ext::{build_table_entry_update, FieldValue, Switch};
use p4model::dash;
use p4model::server;
use p4model::Device;
use proto::p4runtime::{
    CapabilitiesRequest, Entity, Entity_oneof_entity, ForwardingPipelineConfig, GetForwardingPipelineConfigRequest,
    MasterArbitrationUpdate, PacketIn, PacketOut, ReadRequest, SetForwardingPipelineConfigRequest,
    SetForwardingPipelineConfigRequest_Action, StreamMessageRequest, StreamMessageRequest_oneof_update,
    StreamMessageResponse, StreamMessageResponse_oneof_update, TableEntry, Uint128, Update_Type, WriteRequest,
};
use proto::p4runtime_grpc::P4RuntimeClient;
use proto::status::Status;
use protobuf::RepeatedField;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_test::traced_test;

const DEVICE_ID: u64 = 1;

fn election_id(low: u64) -> Uint128 {
    Uint128 {
        high: 0,
        low,
        ..Default::default()
    }
}

/// Starts a DASH device on an ephemeral port and connects a client to it.
fn start_device() -> Result<(Server, Arc<Device>, P4RuntimeClient)> {
    let device = Arc::new(Device::new(Arc::new(dash::pipeline()?)));
    let server = server::start(device.clone(), "127.0.0.1", 0, 2)?;
    let (addr, port) = server.bind_addrs().next().unwrap();
    info!("device is listening on {}:{}", addr, port);

    let env = Arc::new(EnvBuilder::new().build());
    let ch = ChannelBuilder::new(env).connect(&format!("127.0.0.1:{}", port));
    Ok((server, device, P4RuntimeClient::new(ch)))
}

fn set_pipeline_config(client: &P4RuntimeClient, action: SetForwardingPipelineConfigRequest_Action) -> grpcio::Result<()> {
    let sfpcr = SetForwardingPipelineConfigRequest {
        device_id: DEVICE_ID,
        action,
        config: Some(ForwardingPipelineConfig {
            p4info: Some(dash::p4info()).into(),
            ..Default::default()
        })
        .into(),
        ..Default::default()
    };
    client.set_forwarding_pipeline_config(&sfpcr)?;
    Ok(())
}

fn rpc_code<T: std::fmt::Debug>(result: grpcio::Result<T>) -> RpcStatusCode {
    match result {
        Err(grpcio::Error::RpcFailure(status)) => status.code(),
        other => panic!("expected an RPC failure, got {:?}", other),
    }
}

fn acl_entry(switch: &Switch, group: u128, action: &str) -> TableEntry {
    switch
        .build_table_entry(
            "outbound.acl.stage1",
            action,
            &HashMap::new(),
            &[
                ("meta.stage1_dash_acl_group_id", FieldValue::Exact(group)),
                ("meta.ip_protocol", FieldValue::Optional(17)),
            ],
            1,
        )
        .unwrap()
}

fn write_request(updates: Vec<(Update_Type, TableEntry)>) -> WriteRequest {
    WriteRequest {
        device_id: DEVICE_ID,
        election_id: Some(election_id(1)).into(),
        updates: updates
            .into_iter()
            .map(|(update_type, entry)| build_table_entry_update(update_type, entry))
            .collect(),
        ..Default::default()
    }
}

async fn read_all(client: &P4RuntimeClient) -> grpcio::Result<Vec<TableEntry>> {
    let mut everything = Entity::new();
    everything.set_table_entry(TableEntry::new());
    let req = ReadRequest {
        device_id: DEVICE_ID,
        entities: RepeatedField::from_vec(vec![everything]),
        ..Default::default()
    };
    let responses: Vec<_> = client.read(&req)?.try_collect().await?;
    Ok(responses
        .into_iter()
        .flat_map(|r| r.entities.into_iter())
        .filter_map(|e| match e.entity {
            Some(Entity_oneof_entity::table_entry(te)) => Some(te),
            _ => None,
        })
        .collect())
}

#[tokio::test]
#[traced_test]
async fn stream_channel() -> Result<()> {
    let (mut server, device, client) = start_device()?;
    let (mut tx, mut rx) = client.stream_channel()?;

    // Every reply carries the requester's election id and an OK status, even when the requester
    // did not become master.
    for (low, master) in [(5, 5), (2, 5), (7, 7)] {
        let mau = MasterArbitrationUpdate {
            device_id: DEVICE_ID,
            election_id: Some(election_id(low)).into(),
            ..Default::default()
        };
        let smr = StreamMessageRequest {
            update: Some(StreamMessageRequest_oneof_update::arbitration(mau)),
            ..Default::default()
        };
        tx.send((smr, grpcio::WriteFlags::default())).await?;

        let expected = MasterArbitrationUpdate {
            election_id: Some(election_id(low)).into(),
            status: Some(Status::new()).into(),
            ..Default::default()
        };
        assert_eq!(
            rx.next().await.unwrap()?,
            StreamMessageResponse {
                update: Some(StreamMessageResponse_oneof_update::arbitration(expected)),
                ..Default::default()
            }
        );
        assert_eq!(device.master_election_id(), Some((0, master)));
    }

    let smr = StreamMessageRequest {
        update: Some(StreamMessageRequest_oneof_update::packet(PacketOut {
            payload: b"hello".to_vec(),
            ..Default::default()
        })),
        ..Default::default()
    };
    tx.send((smr, grpcio::WriteFlags::default())).await?;
    assert_eq!(
        rx.next().await.unwrap()?,
        StreamMessageResponse {
            update: Some(StreamMessageResponse_oneof_update::packet(PacketIn {
                payload: b"hello".to_vec(),
                ..Default::default()
            })),
            ..Default::default()
        }
    );

    tx.close().await?;
    assert!(rx.next().await.is_none());
    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn pipeline_config() -> Result<()> {
    let (mut server, _device, client) = start_device()?;

    let get = GetForwardingPipelineConfigRequest {
        device_id: DEVICE_ID,
        ..Default::default()
    };
    assert_eq!(rpc_code(client.get_forwarding_pipeline_config(&get)), RpcStatusCode::NOT_FOUND);
    assert_eq!(
        rpc_code(set_pipeline_config(&client, SetForwardingPipelineConfigRequest_Action::VERIFY_AND_SAVE)),
        RpcStatusCode::INVALID_ARGUMENT
    );

    set_pipeline_config(&client, SetForwardingPipelineConfigRequest_Action::VERIFY_AND_COMMIT)?;
    let reply = client.get_forwarding_pipeline_config(&get)?;
    assert_eq!(reply.get_config().get_p4info(), &dash::p4info());

    let capabilities = client.capabilities(&CapabilitiesRequest::new())?;
    assert_eq!(capabilities.get_p4runtime_api_version(), "1.3.0");

    server.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn write_and_read() -> Result<()> {
    let (mut server, device, client) = start_device()?;
    let switch: Switch = (&dash::p4info()).into();

    // Reading before a pipeline is installed fails.
    assert_eq!(rpc_code(read_all(&client).await), RpcStatusCode::FAILED_PRECONDITION);

    set_pipeline_config(&client, SetForwardingPipelineConfigRequest_Action::VERIFY_AND_COMMIT)?;
    assert!(read_all(&client).await?.is_empty());

    let permit = acl_entry(&switch, 10, "outbound.acl.permit");
    let deny = acl_entry(&switch, 20, "outbound.acl.deny");
    client.write(&write_request(vec![
        (Update_Type::INSERT, permit.clone()),
        (Update_Type::INSERT, deny.clone()),
    ]))?;
    assert_eq!(read_all(&client).await?, vec![permit.clone(), deny.clone()]);
    assert_eq!(device.pipeline().table("outbound.acl.stage1")?.len(), 2);

    // A duplicate fails the Write but leaves the earlier update in place.
    let again = acl_entry(&switch, 30, "outbound.acl.permit");
    let result = client.write(&write_request(vec![
        (Update_Type::INSERT, again.clone()),
        (Update_Type::INSERT, permit.clone()),
    ]));
    match result {
        Err(grpcio::Error::RpcFailure(status)) => {
            assert_eq!(status.code(), RpcStatusCode::ALREADY_EXISTS);
            assert!(status.message().starts_with("error processing update [1]"));
        }
        other => panic!("expected ALREADY_EXISTS, got {:?}", other),
    }
    assert_eq!(read_all(&client).await?, vec![permit.clone(), deny.clone(), again.clone()]);

    let mut unknown = permit.clone();
    unknown.set_table_id(0x0200_0fff);
    assert_eq!(
        rpc_code(client.write(&write_request(vec![(Update_Type::INSERT, unknown)]))),
        RpcStatusCode::INVALID_ARGUMENT
    );

    client.write(&write_request(vec![
        (Update_Type::DELETE, permit),
        (Update_Type::DELETE, deny),
    ]))?;
    assert_eq!(read_all(&client).await?, vec![again]);
    assert_eq!(device.pipeline().table("outbound.acl.stage1")?.len(), 1);

    server.shutdown().await?;
    Ok(())
}
