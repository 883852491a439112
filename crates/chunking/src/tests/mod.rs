//! Cross-module tests over the public pipeline.

mod scenarios;

use crate::options::{ChunkingOptions, StrategyName};
use crate::strategy::BuiltinStrategy;

pub(crate) const ENGLISH_PROSE: &str = "Dr. Smith arrived at 5 p.m. on a wet Tuesday. \
The station was nearly empty, and the last train had already left. \
He asked the clerk about the next connection to the coast.\n\n\
The clerk, a patient man, explained the timetable twice. \
Trains ran every two hours in winter, but the evening service was often late. \
Smith thanked him and sat down to wait.\n\n\
By seven the rain had stopped. \
A freight train rolled through without stopping, its wagons loaded with timber. \
When the passenger train finally came, Smith found a seat by the window. \
He watched the lights of the town disappear behind the hills.";

pub(crate) const KOREAN_PROSE: &str = "오늘은 날씨가 맑습니다. 우리는 공원에 갔습니다. \
아이들이 놀이터에서 뛰어놀았어요. 저녁에는 가족과 함께 식사를 했습니다.\n\n\
다음 날은 비가 왔습니다. 집에서 책을 읽었어요. \
오후에는 친구가 찾아왔습니다. 우리는 오랫동안 이야기를 나누었습니다.";

pub(crate) const MARKDOWN_GUIDE: &str = "# Guide\n\n\
This guide explains how to configure the server and call the API.\n\n\
## Install\n\n\
Run the installer and check the version.\n\n\
```sh\ncargo install rechunk\nrechunk --version\n```\n\n\
## Options\n\n\
- max size in tokens\n- min size in tokens\n- overlap in tokens\n\n\
| option | default |\n|---|---|\n| max | 512 |\n| min | 50 |\n\n\
The function reads the config file first. Every class of option can be overridden on the command line.\n";

/// A heading of 49 tokens, above the 40-token test ceiling.
pub(crate) const LONG_HEADING: &str = "# Notes on the quarterly maintenance window for the storage cluster \
covering disk replacement order, firmware upgrades, rebalancing of replicas across racks, \
alerting thresholds during the window, rollback steps if the controller refuses the new firmware, \
and the contact list for every team that owns a service on the cluster\n\n\
Disks are replaced one rack at a time. Each rack is drained before its disks are pulled.\n\n\
Firmware goes out after the disks. The controller is upgraded last.\n";

pub(crate) fn corpus() -> [(&'static str, &'static str); 4] {
    [
        ("english", ENGLISH_PROSE),
        ("korean", KOREAN_PROSE),
        ("markdown", MARKDOWN_GUIDE),
        ("long_heading", LONG_HEADING),
    ]
}

pub(crate) fn options_for(strategy: BuiltinStrategy) -> ChunkingOptions {
    ChunkingOptions::new(StrategyName::parse(strategy.as_str())).with_sizes(40, 5, 8)
}
